use std::path::PathBuf;

use lumina_client::ListScope;

use crate::cli::{DownloadArgs, OutputFormat, ThumbnailArgs, UploadArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{format_bytes, render_upload_report};

pub(crate) async fn handle_upload(
    ctx: &AppContext,
    args: UploadArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let dispatcher = ctx.dispatcher(ListScope::All);
    let report = dispatcher
        .upload(&args.files)
        .await
        .map_err(CliError::from_api)?;
    render_upload_report(&report, output)
}

pub(crate) async fn handle_download(ctx: &AppContext, args: DownloadArgs) -> CliResult<()> {
    let dest = match args.output {
        Some(path) => path,
        None => {
            let record = ctx.api.image(args.id).await.map_err(CliError::from_api)?;
            PathBuf::from(record.original_filename)
        }
    };
    let written = ctx
        .api
        .download_to(args.id, &dest)
        .await
        .map_err(CliError::from_api)?;
    println!(
        "Downloaded image {} to {} ({})",
        args.id,
        dest.display(),
        format_bytes(written)
    );
    Ok(())
}

pub(crate) async fn handle_thumbnail(ctx: &AppContext, args: ThumbnailArgs) -> CliResult<()> {
    let bytes = ctx
        .api
        .thumbnail(args.id, args.width, args.height)
        .await
        .map_err(CliError::from_api)?;
    let dest = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("thumbnail-{}.jpg", args.id)));
    tokio::fs::write(&dest, &bytes)
        .await
        .map_err(|err| {
            CliError::failure(anyhow::anyhow!(
                "failed to write '{}': {err}",
                dest.display()
            ))
        })?;
    println!(
        "Saved {}x{} thumbnail for image {} to {}",
        args.width,
        args.height,
        args.id,
        dest.display()
    );
    Ok(())
}
