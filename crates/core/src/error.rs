//! Error types for Rankwatch operations.
//!
//! This module defines the main error type [`RankwatchError`] which represents
//! every failure that can cross a module boundary: renderer interaction,
//! configuration loading, persistence and export.
//!
//! Extraction misses are deliberately absent. A rank whose fields cannot be
//! recovered is reported as `None` by the field extractor and skipped, so the
//! extraction path itself never produces an error.
//!
//! # Example
//!
//! ```rust
//! use rankwatch_core::{RankwatchError, Result};
//!
//! fn require_markup(html: &str) -> Result<&str> {
//!     if html.is_empty() {
//!         return Err(RankwatchError::NoSnapshot("empty markup".to_string()));
//!     }
//!     Ok(html)
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scraping, persistence and export operations.
///
/// # Example
///
/// ```rust
/// use rankwatch_core::RankwatchError;
///
/// let err = RankwatchError::Timeout { timeout: 30 };
/// assert!(err.to_string().contains("30"));
/// ```
#[derive(Error, Debug)]
pub enum RankwatchError {
    /// The page renderer rejected an interaction.
    ///
    /// Covers navigation failures and click strategies the renderer
    /// cannot perform.
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// No element matched a click target.
    #[error("No element matching '{0}'")]
    ElementNotFound(String),

    /// A bounded wait expired.
    #[error("Timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    ///
    /// Returned when a URL cannot be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request errors from reqwest.
    ///
    /// This variant is only available when the `fetch` feature is enabled.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// No usable page snapshot could be obtained.
    ///
    /// This is the only condition that empties a whole scrape.
    #[error("No usable page snapshot: {0}")]
    NoSnapshot(String),

    /// The data sink rejected a batch of records.
    #[error("Sink rejected records: {0}")]
    Sink(String),

    /// SQLite errors from rusqlite.
    ///
    /// This variant is only available when the `sqlite` feature is enabled.
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Export formatting failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// File I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found.
    ///
    /// Returned when a snapshot or configuration file does not exist.
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Configuration errors.
    ///
    /// Returned when domain maps or scrape options are invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization errors.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for RankwatchError.
///
/// This is a convenience alias for `std::result::Result<T, RankwatchError>`.
pub type Result<T> = std::result::Result<T, RankwatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RankwatchError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_timeout_error() {
        let err = RankwatchError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_element_not_found_names_target() {
        let err = RankwatchError::ElementNotFound("Show more".to_string());
        assert!(err.to_string().contains("Show more"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RankwatchError = io.into();
        assert!(matches!(err, RankwatchError::Io(_)));
    }
}
