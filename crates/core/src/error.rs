//! Error types for sectio operations.
//!
//! This module defines the main error type [`SectioError`] which represents
//! everything that can end a request: upstream failures, transport problems
//! and malformed upstream payloads. Document transforms never produce errors;
//! a missing substructure is reported as absent instead.
//!
//! # Example
//!
//! ```rust
//! use sectio_core::{Result, SectioError};
//!
//! fn require_title(title: &str) -> Result<&str> {
//!     if title.is_empty() {
//!         return Err(SectioError::UpstreamNotFound { title: title.to_string() });
//!     }
//!     Ok(title)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the mobile-sections pipeline.
///
/// Every variant maps onto an HTTP status through [`SectioError::status_code`],
/// which is how the server surfaces upstream failures unmodified.
#[derive(Error, Debug)]
pub enum SectioError {
    /// HTTP request errors from reqwest.
    ///
    /// Network errors, DNS failures and connection problems while talking to
    /// one of the upstream collaborators.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL built from a template or passed by the caller.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors, usually an invalid CSS selector.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The title or revision does not exist upstream.
    #[error("Page not found: {title}")]
    UpstreamNotFound { title: String },

    /// An upstream collaborator answered with a non-success status.
    #[error("Upstream responded with status {status}: {detail}")]
    UpstreamStatus { status: u16, detail: String },

    /// An upstream payload did not have the expected shape.
    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File read/write errors.
    #[error("Failed to access file: {0}")]
    WriteError(#[from] std::io::Error),
}

impl SectioError {
    /// HTTP status code this error is surfaced with.
    ///
    /// Not-found maps to 404, upstream statuses pass through unmodified,
    /// transport failures map to 502 and timeouts to 504.
    pub fn status_code(&self) -> u16 {
        match self {
            SectioError::UpstreamNotFound { .. } | SectioError::FileNotFound(_) => 404,
            SectioError::UpstreamStatus { status, .. } => *status,
            SectioError::Timeout { .. } => 504,
            #[cfg(feature = "fetch")]
            SectioError::HttpError(e) => e.status().map(|s| s.as_u16()).unwrap_or(502),
            SectioError::InvalidResponse(_) => 502,
            SectioError::InvalidUrl(_) => 400,
            SectioError::HtmlParseError(_) | SectioError::Json(_) | SectioError::WriteError(_) => 500,
        }
    }

    /// Whether this error means the page does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == 404
    }
}

/// Result type alias for SectioError.
pub type Result<T> = std::result::Result<T, SectioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SectioError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_not_found_status() {
        let err = SectioError::UpstreamNotFound { title: "Nope".to_string() };
        assert_eq!(err.status_code(), 404);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("Nope"));
    }

    #[test]
    fn test_upstream_status_passes_through() {
        let err = SectioError::UpstreamStatus { status: 503, detail: "unavailable".to_string() };
        assert_eq!(err.status_code(), 503);
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_timeout_error() {
        let err = SectioError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
        assert_eq!(err.status_code(), 504);
    }
}
