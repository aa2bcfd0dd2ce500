//! Mail Cache - A process-local key/value cache with flat-file persistence
//!
//! Keeps expensive-to-compute strings (folder message counts and the like)
//! across runs. Keys can be scoped to a file path, in which case they are
//! only persisted while that path exists.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheStats, SharedCache};
pub use config::{Config, ConfigLookup};
pub use error::{CacheError, Result};
