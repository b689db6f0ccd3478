//! Unified error types for pricescout.
//!
//! Every variant renders with a stable upper-case code prefix so log lines
//! can be grepped and matched without parsing free text.

use std::path::PathBuf;

/// Unified error types for the pricescout crates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., an empty query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The cache file could not be read or written.
    #[error("CACHE_IO: {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The cache file exists but does not hold a JSON object.
    #[error("CACHE_CORRUPT: {path}: {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Page load exceeded its ceiling.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Page body exceeded the configured size ceiling.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// HTTP or transport failure while navigating.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("INVALID_URL"));
        assert!(err.to_string().contains("not a url"));
    }

    #[test]
    fn test_cache_io_display_includes_path() {
        let err = Error::CacheIo {
            path: PathBuf::from("/tmp/cache.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.starts_with("CACHE_IO"));
        assert!(msg.contains("/tmp/cache.json"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
