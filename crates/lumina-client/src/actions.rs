//! Action dispatch: user intents become an API call followed by a full
//! collection refresh.
//!
//! No flag is ever flipped optimistically; a toggle can have server-side
//! side effects (archiving can change trash visibility), so every successful
//! mutation re-fetches the authoritative set. On failure the collection is
//! left untouched and the normalized error is returned for display.

use std::path::{Path, PathBuf};

use lumina_api_models::FileOutcome;

use crate::client::{ApiClient, ListScope};
use crate::collection::{CollectionState, RefreshOutcome};
use crate::error::{ApiError, ApiResult};
use crate::pages;

/// Ceiling applied to upload payloads before any request is issued.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// What a completed mutating action should tell the user.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    /// One-line outcome message, composed from the record's pre-mutation
    /// flags where those change the phrasing.
    pub message: String,
    /// Item count in the collection after the triggered refresh.
    pub refreshed: usize,
}

/// Result of an upload action: one outcome per submitted file plus the
/// post-refresh item count.
#[derive(Debug, Clone)]
pub struct UploadReport {
    /// Per-file outcomes in submission order (successes first for batches,
    /// as reported by the service).
    pub outcomes: Vec<FileOutcome>,
    /// Item count in the collection after the triggered refresh.
    pub refreshed: usize,
}

/// Translates user intents into API calls plus a collection refresh.
pub struct ActionDispatcher {
    client: ApiClient,
    collection: CollectionState,
    scope: ListScope,
    page_size: u32,
}

impl ActionDispatcher {
    /// Build a dispatcher refreshing `scope` with the default page size.
    #[must_use]
    pub fn new(client: ApiClient, collection: CollectionState, scope: ListScope) -> Self {
        Self::with_page_size(client, collection, scope, pages::DEFAULT_PAGE_SIZE)
    }

    /// Build a dispatcher with an explicit refresh page size.
    #[must_use]
    pub const fn with_page_size(
        client: ApiClient,
        collection: CollectionState,
        scope: ListScope,
        page_size: u32,
    ) -> Self {
        Self {
            client,
            collection,
            scope,
            page_size,
        }
    }

    /// The collection this dispatcher refreshes.
    #[must_use]
    pub const fn collection(&self) -> &CollectionState {
        &self.collection
    }

    /// Populate the collection before the first action so outcome messages
    /// can read current flags.
    ///
    /// # Errors
    ///
    /// Returns the normalized fetch error.
    pub async fn prime(&self) -> ApiResult<usize> {
        self.refresh().await
    }

    /// Toggle the favorite flag and refresh.
    ///
    /// # Errors
    ///
    /// Returns the normalized error; the collection is unchanged on failure.
    pub async fn toggle_favorite(&self, id: i64) -> ApiResult<ActionOutcome> {
        let was_favorite = self.collection.find(id).map(|record| record.is_favorite);
        self.client.toggle_favorite(id).await?;
        let refreshed = self.refresh().await?;
        let message = match was_favorite {
            Some(true) => format!("Removed image {id} from favorites"),
            Some(false) => format!("Added image {id} to favorites"),
            None => format!("Toggled favorite for image {id}"),
        };
        Ok(ActionOutcome { message, refreshed })
    }

    /// Toggle the archive flag and refresh.
    ///
    /// # Errors
    ///
    /// Returns the normalized error; the collection is unchanged on failure.
    pub async fn toggle_archive(&self, id: i64) -> ApiResult<ActionOutcome> {
        let was_archived = self.collection.find(id).map(|record| record.is_archived);
        self.client.toggle_archive(id).await?;
        let refreshed = self.refresh().await?;
        let message = match was_archived {
            Some(true) => format!("Unarchived image {id}"),
            Some(false) => format!("Archived image {id}"),
            None => format!("Toggled archive for image {id}"),
        };
        Ok(ActionOutcome { message, refreshed })
    }

    /// Soft-delete a record into the trash and refresh. Confirmation is the
    /// caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns the normalized error; the collection is unchanged on failure.
    pub async fn move_to_trash(&self, id: i64) -> ApiResult<ActionOutcome> {
        self.client.move_to_trash(id).await?;
        let refreshed = self.refresh().await?;
        Ok(ActionOutcome {
            message: format!("Moved image {id} to trash"),
            refreshed,
        })
    }

    /// Restore a record from the trash and refresh.
    ///
    /// # Errors
    ///
    /// Returns the normalized error; the collection is unchanged on failure.
    pub async fn restore(&self, id: i64) -> ApiResult<ActionOutcome> {
        self.client.restore(id).await?;
        let refreshed = self.refresh().await?;
        Ok(ActionOutcome {
            message: format!("Restored image {id} from trash"),
            refreshed,
        })
    }

    /// Permanently delete a record and refresh. Irreversible; confirmation
    /// is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns the normalized error; the collection is unchanged on failure.
    pub async fn delete_permanent(&self, id: i64) -> ApiResult<ActionOutcome> {
        self.client.delete_permanent(id).await?;
        let refreshed = self.refresh().await?;
        Ok(ActionOutcome {
            message: format!("Permanently deleted image {id}"),
            refreshed,
        })
    }

    /// Upload the given files and refresh.
    ///
    /// Exactly one file goes through the single-upload endpoint; two or
    /// more go through the batch endpoint and yield one outcome per file.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Invalid`] when preflight rejects a file locally,
    /// otherwise the normalized request error; the collection is unchanged
    /// on failure.
    pub async fn upload(&self, paths: &[PathBuf]) -> ApiResult<UploadReport> {
        if paths.is_empty() {
            return Err(ApiError::Invalid("no files selected for upload".to_string()));
        }
        for path in paths {
            preflight(path).await?;
        }

        let outcomes = if let [single] = paths {
            let response = self.client.upload(single).await?;
            vec![FileOutcome {
                filename: display_name(single),
                success: true,
                message: response
                    .message
                    .unwrap_or_else(|| "uploaded".to_string()),
            }]
        } else {
            self.client.upload_many(paths).await?.per_file_outcomes()
        };

        let refreshed = self.refresh().await?;
        Ok(UploadReport {
            outcomes,
            refreshed,
        })
    }

    async fn refresh(&self) -> ApiResult<usize> {
        match self
            .collection
            .refresh(&self.client, self.scope, self.page_size)
            .await?
        {
            RefreshOutcome::Committed(count) => Ok(count),
            RefreshOutcome::Superseded => Ok(self.collection.snapshot().items.len()),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned())
}

/// Reject missing or oversized files before anything is sent.
async fn preflight(path: &Path) -> ApiResult<()> {
    let metadata = tokio::fs::metadata(path).await.map_err(|err| {
        ApiError::Invalid(format!("cannot read '{}': {err}", path.display()))
    })?;
    if metadata.len() > MAX_UPLOAD_BYTES {
        return Err(ApiError::Invalid(format!(
            "'{}' is {} bytes, above the {} byte upload limit",
            path.display(),
            metadata.len(),
            MAX_UPLOAD_BYTES
        )));
    }
    Ok(())
}
