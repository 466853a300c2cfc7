use std::io::{self, IsTerminal, Write as _};

use lumina_client::{CollectionState, ListScope, pages, search};

use crate::cli::{ConfirmIdArgs, IdArgs, ListArgs, OutputFormat, SearchArgs};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{render_image_detail, render_image_list};

pub(crate) async fn handle_list(
    ctx: &AppContext,
    args: ListArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let collection = CollectionState::new();
    collection
        .refresh(&ctx.api, args.scope.into(), args.page_size)
        .await
        .map_err(CliError::from_api)?;

    let snapshot = collection.snapshot();
    let visible = match &args.filter {
        Some(query) => search::filter_images(&snapshot.items, query),
        None => snapshot.items.iter().collect(),
    };
    render_image_list(&visible, output)
}

pub(crate) async fn handle_search(
    ctx: &AppContext,
    args: SearchArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let page_size = args.page_size;
    let query = args.query;
    let records = pages::fetch_all(
        |page| {
            let api = ctx.api.clone();
            let query = query.clone();
            async move { api.search_page(&query, page, page_size).await }
        },
        page_size,
        pages::DEFAULT_MAX_PAGES,
        |_| {},
    )
    .await
    .map_err(CliError::from_api)?;

    let visible: Vec<_> = records.iter().collect();
    render_image_list(&visible, output)
}

pub(crate) async fn handle_info(
    ctx: &AppContext,
    args: IdArgs,
    output: OutputFormat,
) -> CliResult<()> {
    let record = ctx.api.image(args.id).await.map_err(CliError::from_api)?;
    render_image_detail(&record, output)
}

pub(crate) async fn handle_favorite(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let dispatcher = ctx.dispatcher(ListScope::All);
    dispatcher.prime().await.map_err(CliError::from_api)?;
    let outcome = dispatcher
        .toggle_favorite(args.id)
        .await
        .map_err(CliError::from_api)?;
    println!("{}", outcome.message);
    Ok(())
}

pub(crate) async fn handle_archive(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let dispatcher = ctx.dispatcher(ListScope::All);
    dispatcher.prime().await.map_err(CliError::from_api)?;
    let outcome = dispatcher
        .toggle_archive(args.id)
        .await
        .map_err(CliError::from_api)?;
    println!("{}", outcome.message);
    Ok(())
}

pub(crate) async fn handle_trash(ctx: &AppContext, args: ConfirmIdArgs) -> CliResult<()> {
    if !confirm_destructive(&format!("Move image {} to trash?", args.id), args.yes)? {
        println!("Aborted.");
        return Ok(());
    }
    let dispatcher = ctx.dispatcher(ListScope::All);
    let outcome = dispatcher
        .move_to_trash(args.id)
        .await
        .map_err(CliError::from_api)?;
    println!("{}", outcome.message);
    Ok(())
}

pub(crate) async fn handle_restore(ctx: &AppContext, args: IdArgs) -> CliResult<()> {
    let dispatcher = ctx.dispatcher(ListScope::Trash);
    let outcome = dispatcher
        .restore(args.id)
        .await
        .map_err(CliError::from_api)?;
    println!("{}", outcome.message);
    Ok(())
}

pub(crate) async fn handle_delete(ctx: &AppContext, args: ConfirmIdArgs) -> CliResult<()> {
    let prompt = format!(
        "Permanently delete image {}? This cannot be undone.",
        args.id
    );
    if !confirm_destructive(&prompt, args.yes)? {
        println!("Aborted.");
        return Ok(());
    }
    let dispatcher = ctx.dispatcher(ListScope::Trash);
    let outcome = dispatcher
        .delete_permanent(args.id)
        .await
        .map_err(CliError::from_api)?;
    println!("{}", outcome.message);
    Ok(())
}

/// Ask the user to confirm a destructive action. Non-interactive runs must
/// pass `--yes` explicitly; destructive actions never proceed silently.
fn confirm_destructive(prompt: &str, assume_yes: bool) -> CliResult<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Err(CliError::validation(
            "confirmation required; pass --yes when running non-interactively",
        ));
    }

    eprint!("{prompt} [y/N]: ");
    io::stderr()
        .flush()
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to write prompt: {err}")))?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .map_err(|err| CliError::failure(anyhow::anyhow!("failed to read confirmation: {err}")))?;
    Ok(matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;
    use httpmock::prelude::*;
    use lumina_client::{ApiClient, CredentialStore};
    use serde_json::json;

    fn context_for(server: &MockServer) -> AppContext {
        let api = ApiClient::new(
            server.base_url().parse().expect("valid URL"),
            CredentialStore::in_memory(),
        )
        .expect("client should build");
        AppContext { api }
    }

    fn record_json(id: i64) -> serde_json::Value {
        json!({
            "id": id,
            "filename": format!("img-{id}.jpg"),
            "storedFilename": format!("{id}-stored.jpg"),
            "originalFilename": format!("holiday-{id}.jpg"),
            "filePath": format!("/data/{id}-stored.jpg"),
            "fileSize": 1_024,
            "contentType": "image/jpeg",
            "uploadDate": "2024-03-01T09:30:00",
            "isFavorite": false,
            "isArchived": false,
            "isDeleted": false
        })
    }

    #[tokio::test]
    async fn list_renders_table_for_each_scope_path() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET).path("/images/favorites");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([record_json(1)]));
        });

        let ctx = context_for(&server);
        let args = ListArgs {
            scope: crate::cli::ScopeArg::Favorites,
            page_size: 10,
            filter: None,
        };
        handle_list(&ctx, args, OutputFormat::Table)
            .await
            .expect("list should succeed");
        mock.assert();
    }

    #[tokio::test]
    async fn list_applies_local_filter_projection() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/images");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([record_json(1), record_json(2)]));
        });

        let ctx = context_for(&server);
        let args = ListArgs {
            scope: crate::cli::ScopeArg::All,
            page_size: 10,
            filter: Some("holiday-2".to_string()),
        };
        handle_list(&ctx, args, OutputFormat::Json)
            .await
            .expect("list should succeed");
    }

    #[tokio::test]
    async fn favorite_toggles_then_refreshes() {
        let server = MockServer::start_async().await;
        let list = server.mock(|when, then| {
            when.method(GET).path("/images");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([record_json(3)]));
        });
        let toggle = server.mock(|when, then| {
            when.method(PUT).path("/images/3/favorite");
            then.status(200);
        });

        let ctx = context_for(&server);
        handle_favorite(&ctx, IdArgs { id: 3 })
            .await
            .expect("favorite should succeed");
        toggle.assert();
        // Prime plus post-action refresh.
        list.assert_calls(2);
    }

    #[tokio::test]
    async fn trash_requires_confirmation_when_non_interactive() {
        let server = MockServer::start_async().await;
        let trash = server.mock(|when, then| {
            when.method(PUT).path("/images/3/trash");
            then.status(200);
        });

        let ctx = context_for(&server);
        let err = handle_trash(&ctx, ConfirmIdArgs { id: 3, yes: false })
            .await
            .expect_err("missing confirmation should fail");
        assert!(matches!(err, CliError::Validation(_)));
        trash.assert_calls(0);
    }

    #[tokio::test]
    async fn delete_with_yes_issues_hard_delete() {
        let server = MockServer::start_async().await;
        let delete = server.mock(|when, then| {
            when.method(DELETE).path("/images/3/permanent");
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(GET).path("/images/trash");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([]));
        });

        let ctx = context_for(&server);
        handle_delete(&ctx, ConfirmIdArgs { id: 3, yes: true })
            .await
            .expect("delete should succeed");
        delete.assert();
    }

    #[tokio::test]
    async fn search_aggregates_every_page() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET)
                .path("/images/search")
                .query_param("query", "holiday")
                .query_param("page", "0");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([record_json(1), record_json(2)]));
        });
        let last = server.mock(|when, then| {
            when.method(GET)
                .path("/images/search")
                .query_param("query", "holiday")
                .query_param("page", "1");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([record_json(3)]));
        });

        let ctx = context_for(&server);
        let args = SearchArgs {
            query: "holiday".to_string(),
            page_size: 2,
        };
        handle_search(&ctx, args, OutputFormat::Table)
            .await
            .expect("search should succeed");
        last.assert();
    }
}
