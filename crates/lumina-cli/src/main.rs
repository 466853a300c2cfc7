//! Thin entrypoint for the `lumina` binary.

use std::process;

#[tokio::main]
async fn main() {
    lumina_cli::init_tracing();
    let exit_code = lumina_cli::run().await;
    if exit_code != 0 {
        process::exit(exit_code);
    }
}
