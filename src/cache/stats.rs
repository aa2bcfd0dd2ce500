//! Cache Statistics Module
//!
//! Tracks persistence and eviction activity: entries loaded and saved,
//! lines skipped, stale scoped entries dropped, and flushes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache activity counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries applied from the cache file across all loads
    pub entries_loaded: u64,
    /// Malformed lines skipped while loading
    pub lines_skipped: u64,
    /// Lines written across all saves
    pub entries_saved: u64,
    /// Scoped entries left out of a save because their path was gone
    pub entries_dropped: u64,
    /// Number of times the cache was emptied by `flush` or `trim`
    pub flushes: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Load ==
    /// Adds the outcome of one load.
    pub fn record_load(&mut self, loaded: u64, skipped: u64) {
        self.entries_loaded += loaded;
        self.lines_skipped += skipped;
    }

    // == Record Save ==
    /// Adds the outcome of one save.
    pub fn record_save(&mut self, saved: u64, dropped: u64) {
        self.entries_saved += saved;
        self.entries_dropped += dropped;
    }

    // == Record Flush ==
    /// Increments the flush counter.
    pub fn record_flush(&mut self) {
        self.flushes += 1;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
