//! Cache Module
//!
//! Provides a process-local string cache with flat-file persistence and
//! size-based flushing.

pub mod fs;
pub mod key;
mod persist;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use fs::{Filesystem, LocalFs};
pub use persist::cache_file_path;
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::Cache;

// == Public Constants ==
/// Entry count above which `Cache::trim` flushes by default
pub const DEFAULT_TRIM_THRESHOLD: usize = 50_000;

/// Separates a scoped key's path from its name
pub const SCOPE_DELIMITER: char = '\'';

/// Separates key from value in the cache file
pub const ENTRY_SEPARATOR: char = '=';
