//! Configuration Module
//!
//! The cache never reaches for global state: callers hand it anything that
//! implements [`ConfigLookup`]. [`Config`] is the environment-backed
//! implementation used by the binary.

use std::collections::HashMap;
use std::env;

use crate::cache::DEFAULT_TRIM_THRESHOLD;

// == Well-known Keys ==
/// Config key naming the directory that holds the cache file.
pub const CACHE_PREFIX_KEY: &str = "cache.prefix";

/// Config key naming the version string, used as the cache file name.
pub const VERSION_KEY: &str = "global.version";

// == Config Lookup ==
/// String-valued configuration lookup consumed by `Cache::load`/`Cache::save`.
///
/// An unset key is a normal outcome and yields `None`.
pub trait ConfigLookup {
    fn get_config(&self, key: &str) -> Option<String>;
}

impl ConfigLookup for HashMap<String, String> {
    fn get_config(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<T: ConfigLookup + ?Sized> ConfigLookup for &T {
    fn get_config(&self, key: &str) -> Option<String> {
        (**self).get_config(key)
    }
}

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the cache file; `None` disables persistence
    pub cache_prefix: Option<String>,
    /// Version string, used as the cache file name
    pub version: String,
    /// Entry count above which `trim` flushes the cache
    pub trim_threshold: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAIL_CACHE_PREFIX` - Cache directory (default: unset, persistence disabled)
    /// - `MAIL_CACHE_VERSION` - Cache file name (default: crate version)
    /// - `MAIL_CACHE_TRIM_THRESHOLD` - Trim threshold (default: 50000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_prefix: env::var("MAIL_CACHE_PREFIX")
                .ok()
                .filter(|v| !v.is_empty()),
            version: env::var("MAIL_CACHE_VERSION")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.version),
            trim_threshold: env::var("MAIL_CACHE_TRIM_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.trim_threshold),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_prefix: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            trim_threshold: DEFAULT_TRIM_THRESHOLD,
        }
    }
}

impl ConfigLookup for Config {
    fn get_config(&self, key: &str) -> Option<String> {
        match key {
            CACHE_PREFIX_KEY => self.cache_prefix.clone(),
            VERSION_KEY => Some(self.version.clone()),
            _ => None,
        }
    }
}
