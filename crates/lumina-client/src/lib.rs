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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Core client library for the Lumina photo service.
//!
//! The service owns all business logic (storage, thumbnailing, persistence,
//! authentication); this crate is the request-orchestration layer that keeps
//! an in-memory collection synchronized with it:
//!
//! - `client`: one async operation per backend capability, with credential
//!   attachment and normalized errors
//! - `auth`: the credential store (persisted best-effort, published over a
//!   watch channel)
//! - `pages`: pagination aggregation with short-page exhaustion
//! - `collection`: the view-state holder with cancel-and-replace refreshes
//! - `actions`: user intents as API call + full refresh
//! - `search`: pure filter projection and debounced recomputation
//! - `error`: the failure taxonomy every operation normalizes into

pub mod actions;
pub mod auth;
pub mod client;
pub mod collection;
pub mod error;
pub mod pages;
pub mod search;

pub use actions::{ActionDispatcher, ActionOutcome, MAX_UPLOAD_BYTES, UploadReport};
pub use auth::{Credential, CredentialStore};
pub use client::{ApiClient, DEFAULT_TIMEOUT_SECS, ListScope};
pub use collection::{CollectionSnapshot, CollectionState, RefreshOutcome};
pub use error::{ApiError, ApiResult};
