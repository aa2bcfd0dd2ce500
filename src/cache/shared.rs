//! Shared Cache Module
//!
//! Thread-safe handle for callers that need to share one cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::{Cache, CacheStats};
use crate::config::ConfigLookup;
use crate::error::Result;

/// Cloneable handle to a [`Cache`] behind a single mutex.
///
/// The one lock covers map mutations and file I/O alike, so a `save` never
/// observes a half-applied `load`.
#[derive(Debug, Clone, Default)]
pub struct SharedCache {
    inner: Arc<Mutex<Cache>>,
}

impl SharedCache {
    /// Wraps an existing cache.
    pub fn new(cache: Cache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Locks the cache for a sequence of operations.
    ///
    /// A panic in another holder cannot leave the map half-updated, so a
    /// poisoned lock is recovered rather than propagated.
    pub fn lock(&self) -> MutexGuard<'_, Cache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) {
        self.lock().set(name, value);
    }

    pub fn set_file(&self, path: &str, name: &str, value: impl Into<String>) {
        self.lock().set_file(path, name, value);
    }

    pub fn get(&self, name: &str) -> Option<String> {
        self.lock().get(name).map(str::to_string)
    }

    pub fn get_file(&self, path: &str, name: &str) -> Option<String> {
        self.lock().get_file(path, name).map(str::to_string)
    }

    pub fn size(&self) -> usize {
        self.lock().size()
    }

    pub fn flush(&self) {
        self.lock().flush();
    }

    pub fn trim(&self) -> bool {
        self.lock().trim()
    }

    pub fn load(&self, config: &impl ConfigLookup) -> Result<usize> {
        self.lock().load(config)
    }

    pub fn save(&self, config: &impl ConfigLookup) -> Result<usize> {
        self.lock().save(config)
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }
}
