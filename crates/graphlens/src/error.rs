//! Error types for graphlens operations.
//!
//! The analytic stages (metrics, relationship queries, flow and impact
//! detection, collapse redirection, filtering) are infallible: bad input data
//! degenerates to empty output instead of failing. Errors are reserved for the
//! edges of the pipeline:
//!
//! - loading snapshots and configuration from disk
//! - the external layout engine
//! - lookups of nodes the caller named explicitly

use thiserror::Error;

/// Result type for graphlens operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for graphlens operations.
#[derive(Debug, Error)]
pub enum Error {
    /// File system operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or output JSON could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration file or values
    #[error("configuration error: {0}")]
    Config(String),

    /// The layout engine failed to produce positions
    #[error("layout error: {0}")]
    Layout(String),

    /// A node id named by the caller is not part of the current snapshot
    #[error("node not found: {0}")]
    NodeNotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display_includes_reason() {
        let error = Error::Config("coupling threshold must be <= 1".to_string());
        assert_eq!(
            error.to_string(),
            "configuration error: coupling threshold must be <= 1"
        );
    }

    #[test]
    fn json_error_converts_via_from() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: Error = parse.into();
        assert!(matches!(error, Error::Json(_)));
        assert!(error.to_string().starts_with("JSON error"));
    }
}
