//! Cache Store Module
//!
//! In-memory string map with file-scoped keys and a size cliff for eviction.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::cache::key::scoped_key;
use crate::cache::{CacheStats, DEFAULT_TRIM_THRESHOLD};

// == Cache ==
/// Process-local key/value cache.
///
/// Keys and values are opaque strings. A key built with [`Cache::set_file`]
/// is tied to a path and is only persisted while that path exists.
#[derive(Debug)]
pub struct Cache {
    /// Key-value storage
    pub(crate) entries: HashMap<String, String>,
    /// Activity counters
    pub(crate) stats: CacheStats,
    /// Entry count above which `trim` flushes
    trim_threshold: usize,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    // == Constructor ==
    /// Creates an empty cache with the default trim threshold.
    pub fn new() -> Self {
        Self::with_trim_threshold(DEFAULT_TRIM_THRESHOLD)
    }

    /// Creates an empty cache that trims above `trim_threshold` entries.
    pub fn with_trim_threshold(trim_threshold: usize) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            trim_threshold,
        }
    }

    // == Set ==
    /// Stores `value` under `name`, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Stores `value` under the scoped key for `path` and `name`.
    pub fn set_file(&mut self, path: &str, name: &str, value: impl Into<String>) {
        self.set(scoped_key(path, name), value);
    }

    // == Get ==
    /// Returns the value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns the value stored under the scoped key for `path` and `name`.
    pub fn get_file(&self, path: &str, name: &str) -> Option<&str> {
        self.get(&scoped_key(path, name))
    }

    /// Returns true if `name` has a value.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterates over all `(key, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // == Size ==
    /// Returns the current number of entries.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Flush ==
    /// Discards every entry.
    pub fn flush(&mut self) {
        debug!("Flushing {} cache entries", self.entries.len());
        self.entries.clear();
        self.stats.record_flush();
    }

    // == Trim ==
    /// Flushes the cache if it holds more than the configured threshold.
    ///
    /// Returns true if a flush happened.
    pub fn trim(&mut self) -> bool {
        self.trim_at(self.trim_threshold)
    }

    /// Flushes the cache if it holds more than `threshold` entries.
    ///
    /// This is all-or-nothing: no entry is kept once the cliff is crossed.
    pub fn trim_at(&mut self, threshold: usize) -> bool {
        let size = self.size();
        if size <= threshold {
            return false;
        }

        info!(
            "Cache trim: {} entries exceeds threshold {}, flushing",
            size, threshold
        );
        self.flush();
        true
    }

    /// Returns the threshold used by [`Cache::trim`].
    pub fn trim_threshold(&self) -> usize {
        self.trim_threshold
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }
}
