//! Normalized error taxonomy for backend calls.
//!
//! Every failure a caller can see is one of these variants, produced by a
//! fixed classification precedence: connectivity first, then the well-known
//! statuses, then whatever the service said, then a generic fallback that
//! keeps the status code visible for diagnosis. Retries are never automatic;
//! connectivity failures are retried only by an explicit user action.

use thiserror::Error;

/// Normalized failure surfaced by [`crate::ApiClient`] operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached the service (connect failure, timeout,
    /// interrupted body).
    #[error("cannot connect to the photo service at {url}: {reason}")]
    Connectivity {
        /// Endpoint the request was addressed to.
        url: String,
        /// Transport-level failure description.
        reason: String,
    },
    /// The service returned 401; the stored credential has been invalidated.
    #[error("authentication failed; please log in again")]
    Unauthorized,
    /// The service returned 403.
    #[error("access forbidden; you do not have permission for this action")]
    Forbidden,
    /// The service returned 413.
    #[error("file too large; the service rejected the upload")]
    FileTooLarge,
    /// The service returned 415.
    #[error("unsupported file type; upload a supported image format (jpg, png, gif, webp)")]
    UnsupportedMediaType,
    /// The service returned a 5xx status.
    #[error("server error (status {status}); please try again later")]
    Server {
        /// The status code observed.
        status: u16,
    },
    /// Fallback for any other non-success status.
    #[error("{message} (status {status})")]
    Unexpected {
        /// The status code observed.
        status: u16,
        /// Server-supplied error text, or a generic placeholder.
        message: String,
    },
    /// A 2xx response carried a body this client could not interpret.
    #[error("failed to decode {context}: {reason}")]
    Decode {
        /// What was being decoded.
        context: &'static str,
        /// Parser failure description.
        reason: String,
    },
    /// The request was rejected locally before anything was sent.
    #[error("{0}")]
    Invalid(String),
}

impl ApiError {
    /// Classify a non-success HTTP status, preferring `server_message` for
    /// statuses without a fixed mapping.
    #[must_use]
    pub fn classify_status(status: u16, server_message: Option<String>) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            413 => Self::FileTooLarge,
            415 => Self::UnsupportedMediaType,
            500..=599 => Self::Server { status },
            _ => Self::Unexpected {
                status,
                message: server_message.unwrap_or_else(|| "unknown error".to_string()),
            },
        }
    }

    /// Whether this failure invalidated the stored credential.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// Result alias used across the client library.
pub type ApiResult<T> = Result<T, ApiError>;
