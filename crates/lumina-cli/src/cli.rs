//! Argument parsing and command dispatch for the `lumina` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use lumina_client::{CredentialStore, DEFAULT_TIMEOUT_SECS, ListScope, pages};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::client::{AppContext, CliResult};
use crate::commands::auth::{handle_login, handle_logout};
use crate::commands::images::{
    handle_archive, handle_delete, handle_favorite, handle_info, handle_list, handle_restore,
    handle_search, handle_trash,
};
use crate::commands::status::{handle_health, handle_stats};
use crate::commands::transfer::{handle_download, handle_thumbnail, handle_upload};

const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Install the global tracing subscriber for CLI runs. Logs go to stderr so
/// rendered output stays pipeable.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse CLI arguments and execute the requested command. Returns the
/// process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    let store = CredentialStore::open_default();
    let ctx = AppContext::new(cli.api_url, cli.timeout, store)?;
    tracing::debug!(api_url = %ctx.api.base_url(), "constructed client context");

    match cli.command {
        Command::Login(args) => handle_login(&ctx, args).await,
        Command::Logout => handle_logout(&ctx),
        Command::Ls(args) => handle_list(&ctx, args, cli.output).await,
        Command::Search(args) => handle_search(&ctx, args, cli.output).await,
        Command::Info(args) => handle_info(&ctx, args, cli.output).await,
        Command::Upload(args) => handle_upload(&ctx, args, cli.output).await,
        Command::Favorite(args) => handle_favorite(&ctx, args).await,
        Command::Archive(args) => handle_archive(&ctx, args).await,
        Command::Trash(args) => handle_trash(&ctx, args).await,
        Command::Restore(args) => handle_restore(&ctx, args).await,
        Command::Delete(args) => handle_delete(&ctx, args).await,
        Command::Download(args) => handle_download(&ctx, args).await,
        Command::Thumbnail(args) => handle_thumbnail(&ctx, args).await,
        Command::Stats => handle_stats(&ctx, cli.output).await,
        Command::Health => handle_health(&ctx).await,
    }
}

#[derive(Parser)]
#[command(name = "lumina", about = "Command-line client for a Lumina photo service")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "LUMINA_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "LUMINA_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    pub(crate) output: OutputFormat,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Validate credentials against the service and store them.
    Login(LoginArgs),
    /// Clear the stored credentials.
    Logout,
    /// List a gallery scope.
    Ls(ListArgs),
    /// Search images by original filename, server-side.
    Search(SearchArgs),
    /// Show one image record.
    Info(IdArgs),
    /// Upload one or more image files.
    Upload(UploadArgs),
    /// Toggle the favorite flag on an image.
    Favorite(IdArgs),
    /// Toggle the archive flag on an image.
    Archive(IdArgs),
    /// Move an image to the trash.
    Trash(ConfirmIdArgs),
    /// Restore an image from the trash.
    Restore(IdArgs),
    /// Permanently delete an image. Irreversible.
    Delete(ConfirmIdArgs),
    /// Download an original image.
    Download(DownloadArgs),
    /// Fetch a thumbnail rendition of an image.
    Thumbnail(ThumbnailArgs),
    /// Show collection counters.
    Stats,
    /// Probe service connectivity.
    Health,
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(help = "Account username")]
    pub(crate) username: String,
    #[arg(long, help = "Password; prompted for when omitted on a terminal")]
    pub(crate) password: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct ListArgs {
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub(crate) scope: ScopeArg,
    #[arg(long, default_value_t = pages::DEFAULT_PAGE_SIZE)]
    pub(crate) page_size: u32,
    #[arg(long, help = "Case-insensitive substring filter on original filenames")]
    pub(crate) filter: Option<String>,
}

#[derive(Args)]
pub(crate) struct SearchArgs {
    #[arg(help = "Query matched against original filenames")]
    pub(crate) query: String,
    #[arg(long, default_value_t = pages::DEFAULT_PAGE_SIZE)]
    pub(crate) page_size: u32,
}

#[derive(Args)]
pub(crate) struct IdArgs {
    #[arg(help = "Image identifier")]
    pub(crate) id: i64,
}

#[derive(Args)]
pub(crate) struct ConfirmIdArgs {
    #[arg(help = "Image identifier")]
    pub(crate) id: i64,
    #[arg(long, help = "Skip the confirmation prompt")]
    pub(crate) yes: bool,
}

#[derive(Args)]
pub(crate) struct UploadArgs {
    #[arg(required = true, help = "Image files to upload")]
    pub(crate) files: Vec<PathBuf>,
}

#[derive(Args)]
pub(crate) struct DownloadArgs {
    #[arg(help = "Image identifier")]
    pub(crate) id: i64,
    #[arg(
        short = 'o',
        long,
        help = "Destination path; defaults to the original filename"
    )]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct ThumbnailArgs {
    #[arg(help = "Image identifier")]
    pub(crate) id: i64,
    #[arg(long, default_value_t = 150)]
    pub(crate) width: u32,
    #[arg(long, default_value_t = 150)]
    pub(crate) height: u32,
    #[arg(short = 'o', long, help = "Destination path")]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum ScopeArg {
    #[default]
    All,
    Favorites,
    Archived,
    Trash,
}

impl From<ScopeArg> for ListScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::All => Self::All,
            ScopeArg::Favorites => Self::Favorites,
            ScopeArg::Archived => Self::Archived,
            ScopeArg::Trash => Self::Trash,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
