//! Error types for the mail cache
//!
//! Provides unified error handling using thiserror.
//!
//! Absence (a missing key, an unset config value, a missing cache file) is
//! never an error here. Only I/O failures during load/save are surfaced.

use std::path::Path;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the mail cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Reading, writing or creating a cache file or directory failed
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an IO error describing `action` on `path`
    pub fn io_at(action: &str, path: &Path, source: std::io::Error) -> Self {
        Self::io(format!("{} {}", action, path.display()), source)
    }
}

// == Result Type Alias ==
/// Convenience Result type for the mail cache.
pub type Result<T> = std::result::Result<T, CacheError>;
