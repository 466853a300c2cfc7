#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
//! Shared HTTP DTOs for the Lumina photo service REST API.
//!
//! These types mirror the wire contract exactly (the service emits camelCase
//! field names and mixes three response shapes for list endpoints: a bare
//! array, a Spring-style page, and either of those wrapped in a
//! `{success, data, message, error}` envelope). The tolerant decode helpers
//! live here so every consumer shares one interpretation of that contract.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One stored photo as reported by the service.
///
/// Records are immutable on the client: every state change is re-fetched
/// from the service rather than patched in place. `id` is the sole identity
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Server-assigned identifier; unique and immutable.
    pub id: i64,
    /// Display filename.
    pub filename: String,
    /// Name the service stored the object under.
    pub stored_filename: String,
    /// Filename the file had when it was uploaded.
    pub original_filename: String,
    /// Server-side storage path.
    pub file_path: String,
    /// Size of the original in bytes.
    pub file_size: u64,
    /// MIME type recorded at upload time.
    pub content_type: String,
    /// Upload timestamp as emitted by the service (no UTC offset).
    pub upload_date: NaiveDateTime,
    #[serde(default)]
    /// Whether the image is currently marked as a favorite.
    pub is_favorite: bool,
    #[serde(default)]
    /// Whether the image is currently archived.
    pub is_archived: bool,
    #[serde(default)]
    /// Whether the image is in the trash (soft-deleted).
    pub is_deleted: bool,
}

/// Spring-style pagination envelope returned by the list endpoints.
///
/// Everything except `content` is optional in practice; some endpoints omit
/// the totals, so exhaustion must be detected from page length alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page, in server order.
    pub content: Vec<T>,
    #[serde(default)]
    /// Total records across all pages, when the service reports it.
    pub total_elements: u64,
    #[serde(default)]
    /// Total page count, when the service reports it.
    pub total_pages: u32,
    #[serde(default)]
    /// Requested page size.
    pub size: u32,
    #[serde(default)]
    /// Zero-based index of this page.
    pub number: u32,
    #[serde(default)]
    /// Whether this is the first page.
    pub first: bool,
    #[serde(default)]
    /// Whether this is the last page.
    pub last: bool,
    #[serde(default)]
    /// Whether this page carries no records.
    pub empty: bool,
}

/// A list response that is either a [`Page`] or a bare array.
///
/// The same endpoint shape can produce both; the `content` field is the
/// discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageOrList<T> {
    /// Paginated envelope (`content` present).
    Page(Page<T>),
    /// Bare array of records.
    Items(Vec<T>),
}

impl<T> PageOrList<T> {
    /// Number of records carried by this response.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Page(page) => page.content.len(),
            Self::Items(items) => items.len(),
        }
    }

    /// Whether this response carries no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extract the records, discarding any pagination metadata.
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Page(page) => page.content,
            Self::Items(items) => items,
        }
    }
}

/// Generic `{success, data, message, error}` wrapper some endpoints use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct ResponseEnvelope<T> {
    /// Whether the service considered the request successful.
    pub success: bool,
    #[serde(default)]
    /// The real payload, when present.
    pub data: Option<T>,
    #[serde(default)]
    /// Optional human-readable status message.
    pub message: Option<String>,
    #[serde(default)]
    /// Optional error description on failure.
    pub error: Option<String>,
}

/// A payload that may or may not be wrapped in a [`ResponseEnvelope`].
///
/// The required `success` field discriminates: bodies without it decode as
/// the bare payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaybeEnveloped<T> {
    /// Envelope-wrapped payload.
    Enveloped(ResponseEnvelope<T>),
    /// Bare payload.
    Bare(T),
}

impl<T> MaybeEnveloped<T> {
    /// Failure description when the envelope reports an unsuccessful
    /// request, preferring the `error` field over `message`.
    #[must_use]
    pub fn failure_message(&self) -> Option<&str> {
        match self {
            Self::Enveloped(envelope) if !envelope.success => envelope
                .error
                .as_deref()
                .or(envelope.message.as_deref())
                .or(Some("request reported failure")),
            _ => None,
        }
    }

    /// Unwrap to the payload, if one was carried.
    #[must_use]
    pub fn into_data(self) -> Option<T> {
        match self {
            Self::Enveloped(envelope) => envelope.data,
            Self::Bare(value) => Some(value),
        }
    }
}

/// Collection counters returned by `GET /images/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageStats {
    /// Images currently visible in the main gallery.
    pub total_images: u64,
    /// Images flagged as favorites.
    pub favorites: u64,
    /// Archived images.
    pub archived: u64,
    /// Images sitting in the trash.
    pub trash: u64,
}

/// Body returned by the single-file upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SingleUploadResponse {
    #[serde(default)]
    /// Status message for the upload.
    pub message: Option<String>,
    #[serde(default)]
    /// The stored record, when the service echoes it back.
    pub image: Option<ImageRecord>,
}

/// Per-file success entry in a batch upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUploadEntry {
    #[serde(default)]
    /// Position of the file in the submitted batch.
    pub index: Option<u32>,
    /// Filename as submitted.
    pub filename: String,
    #[serde(default)]
    /// Status label reported by the service.
    pub status: Option<String>,
    #[serde(default)]
    /// The stored record, when the service echoes it back.
    pub image: Option<ImageRecord>,
}

/// Per-file failure entry in a batch upload response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchUploadError {
    /// Filename as submitted.
    pub filename: String,
    /// Why this file was rejected.
    pub error: String,
}

/// Body returned by the batch upload endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchUploadResponse {
    #[serde(default)]
    /// Aggregate status message.
    pub message: Option<String>,
    #[serde(default)]
    /// Count of files stored successfully.
    pub successful: u32,
    #[serde(default)]
    /// Count of files rejected.
    pub failed: u32,
    #[serde(default)]
    /// Entries for the stored files.
    pub results: Vec<BatchUploadEntry>,
    #[serde(default)]
    /// Entries for the rejected files.
    pub errors: Vec<BatchUploadError>,
}

/// Normalized per-file outcome a caller can present directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    /// Filename as submitted.
    pub filename: String,
    /// Whether the file was stored.
    pub success: bool,
    /// Status or error message for the file.
    pub message: String,
}

impl BatchUploadResponse {
    /// Fold the success and failure entries into one per-file outcome list,
    /// successes first, preserving the service's reported order within each
    /// group.
    #[must_use]
    pub fn per_file_outcomes(&self) -> Vec<FileOutcome> {
        let mut outcomes = Vec::with_capacity(self.results.len() + self.errors.len());
        for entry in &self.results {
            outcomes.push(FileOutcome {
                filename: entry.filename.clone(),
                success: true,
                message: entry
                    .status
                    .clone()
                    .unwrap_or_else(|| "uploaded".to_string()),
            });
        }
        for entry in &self.errors {
            outcomes.push(FileOutcome {
                filename: entry.filename.clone(),
                success: false,
                message: entry.error.clone(),
            });
        }
        outcomes
    }
}
