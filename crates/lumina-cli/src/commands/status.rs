use crate::cli::OutputFormat;
use crate::client::{AppContext, CliError, CliResult};
use crate::output::render_stats;

pub(crate) async fn handle_health(ctx: &AppContext) -> CliResult<()> {
    let body = ctx.api.health().await.map_err(CliError::from_api)?;
    println!("service reachable: {}", body.trim());
    Ok(())
}

pub(crate) async fn handle_stats(ctx: &AppContext, output: OutputFormat) -> CliResult<()> {
    let stats = ctx.api.stats().await.map_err(CliError::from_api)?;
    render_stats(&stats, output)
}
