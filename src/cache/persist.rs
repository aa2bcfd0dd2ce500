//! Persistence Module
//!
//! Loads and saves the cache as `key=value` lines in `<cache_dir>/<version>`.
//!
//! Loading merges into the current map and never checks scoped paths.
//! Saving writes every plain entry, plus every scoped entry whose path still
//! exists, then swaps the new file in with a rename.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::fs::{Filesystem, LocalFs};
use crate::cache::key::{format_line, parse_line, parse_scoped};
use crate::cache::Cache;
use crate::config::{ConfigLookup, CACHE_PREFIX_KEY, VERSION_KEY};
use crate::error::{CacheError, Result};

/// Returns the cache file path for `version` under `cache_dir`.
pub fn cache_file_path(cache_dir: &Path, version: &str) -> PathBuf {
    cache_dir.join(version)
}

/// Resolves `(cache_dir, version)` from the config.
///
/// Returns `None` if either is unset, which disables persistence.
fn resolve(config: &impl ConfigLookup) -> Option<(PathBuf, String)> {
    let dir = config.get_config(CACHE_PREFIX_KEY)?;
    let version = config.get_config(VERSION_KEY)?;
    Some((PathBuf::from(dir), version))
}

impl Cache {
    // == Load ==
    /// Merges the cache file named by `config` into this cache.
    ///
    /// Returns the number of entries applied. An unset cache directory or
    /// version, or a missing file, is a no-op.
    pub fn load(&mut self, config: &impl ConfigLookup) -> Result<usize> {
        match resolve(config) {
            Some((dir, version)) => self.load_dir(Some(&dir), &version),
            None => {
                debug!("Cache load skipped: no cache directory configured");
                Ok(0)
            }
        }
    }

    /// Merges `<cache_dir>/<version>` into this cache.
    pub fn load_dir(&mut self, cache_dir: Option<&Path>, version: &str) -> Result<usize> {
        self.load_dir_with(cache_dir, version, &LocalFs)
    }

    /// Like [`Cache::load_dir`], asking `filesystem` whether the cache file exists.
    pub fn load_dir_with(
        &mut self,
        cache_dir: Option<&Path>,
        version: &str,
        filesystem: &impl Filesystem,
    ) -> Result<usize> {
        let Some(cache_dir) = cache_dir else {
            return Ok(0);
        };

        let path = cache_file_path(cache_dir, version);
        if !filesystem.path_exists(&path) {
            debug!("Cache file {} does not exist, nothing to load", path.display());
            return Ok(0);
        }

        let file =
            File::open(&path).map_err(|e| CacheError::io_at("failed to open", &path, e))?;
        self.load_from_reader(BufReader::new(file), &path)
    }

    fn load_from_reader(&mut self, mut reader: impl BufRead, path: &Path) -> Result<usize> {
        let mut loaded = 0usize;
        let mut skipped = 0usize;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|e| CacheError::io_at("failed to read", path, e))?;
            if read == 0 {
                break;
            }
            if buf.last() == Some(&b'\n') {
                buf.pop();
            }

            // Non-UTF-8 lines are malformed like any other
            let parsed = std::str::from_utf8(&buf).ok().and_then(parse_line);
            match parsed {
                Some((key, value)) => {
                    self.set(key, value);
                    loaded += 1;
                }
                None => skipped += 1,
            }
        }

        self.stats.record_load(loaded as u64, skipped as u64);
        debug!(
            "Loaded {} cache entries from {} ({} lines skipped)",
            loaded,
            path.display(),
            skipped
        );
        Ok(loaded)
    }

    // == Save ==
    /// Writes this cache to the file named by `config`.
    ///
    /// Returns the number of lines written. An unset cache directory or
    /// version is a no-op.
    pub fn save(&mut self, config: &impl ConfigLookup) -> Result<usize> {
        match resolve(config) {
            Some((dir, version)) => self.save_dir(Some(&dir), &version),
            None => {
                debug!("Cache save skipped: no cache directory configured");
                Ok(0)
            }
        }
    }

    /// Writes this cache to `<cache_dir>/<version>`.
    pub fn save_dir(&mut self, cache_dir: Option<&Path>, version: &str) -> Result<usize> {
        self.save_dir_with(cache_dir, version, &LocalFs)
    }

    /// Like [`Cache::save_dir`], using `filesystem` for directory creation and for
    /// checking scoped paths.
    ///
    /// Scoped entries whose path is gone are left out of the file but stay
    /// in memory. The existing file is replaced only once the new one is
    /// fully written.
    pub fn save_dir_with(
        &mut self,
        cache_dir: Option<&Path>,
        version: &str,
        filesystem: &impl Filesystem,
    ) -> Result<usize> {
        let Some(cache_dir) = cache_dir else {
            return Ok(0);
        };

        if !filesystem.path_exists(cache_dir) {
            debug!("Creating cache directory {}", cache_dir.display());
            filesystem
                .make_directory(cache_dir)
                .map_err(|e| CacheError::io_at("failed to create directory", cache_dir, e))?;
        }

        let path = cache_file_path(cache_dir, version);
        let tmp_path = cache_dir.join(format!(".{}.tmp", version));

        let (saved, dropped) = match self.write_entries(&tmp_path, filesystem) {
            Ok(counts) => counts,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };

        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(CacheError::io_at("failed to replace", &path, e));
        }

        self.stats.record_save(saved as u64, dropped as u64);
        debug!(
            "Saved {} cache entries to {} ({} stale scoped entries dropped)",
            saved,
            path.display(),
            dropped
        );
        Ok(saved)
    }

    /// Writes the persistable entries to `path`, returning `(saved, dropped)`.
    ///
    /// The file handle is closed when this returns, on every path.
    fn write_entries(&self, path: &Path, filesystem: &impl Filesystem) -> Result<(usize, usize)> {
        let file =
            File::create(path).map_err(|e| CacheError::io_at("failed to create", path, e))?;
        let mut writer = BufWriter::new(file);
        let mut saved = 0usize;
        let mut dropped = 0usize;

        for (key, value) in &self.entries {
            if let Some((scope, _)) = parse_scoped(key) {
                if !filesystem.path_exists(Path::new(scope)) {
                    dropped += 1;
                    continue;
                }
            }

            writeln!(writer, "{}", format_line(key, value))
                .map_err(|e| CacheError::io_at("failed to write", path, e))?;
            saved += 1;
        }

        let file = writer
            .into_inner()
            .map_err(|e| CacheError::io_at("failed to flush", path, e.into_error()))?;
        file.sync_all()
            .map_err(|e| CacheError::io_at("failed to sync", path, e))?;

        Ok((saved, dropped))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use tempfile::TempDir;

    /// Answers existence from a fixed set, delegating real I/O to disk.
    struct FakeFs {
        existing: HashSet<PathBuf>,
        created: RefCell<Vec<PathBuf>>,
    }

    impl FakeFs {
        fn new(existing: &[&Path]) -> Self {
            Self {
                existing: existing.iter().map(|p| p.to_path_buf()).collect(),
                created: RefCell::new(Vec::new()),
            }
        }
    }

    impl Filesystem for FakeFs {
        fn path_exists(&self, path: &Path) -> bool {
            self.existing.contains(path) || path.exists()
        }

        fn make_directory(&self, path: &Path) -> io::Result<()> {
            self.created.borrow_mut().push(path.to_path_buf());
            std::fs::create_dir(path)
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        let mut lines: Vec<String> = fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        lines.sort();
        lines
    }

    #[test]
    fn test_cache_file_path() {
        assert_eq!(
            cache_file_path(Path::new("/var/cache/mail"), "1.0"),
            PathBuf::from("/var/cache/mail/1.0")
        );
    }

    #[test]
    fn test_load_without_directory_is_noop() {
        let mut cache = Cache::new();
        cache.set("keep", "me");

        assert_eq!(cache.load_dir(None, "1.0").unwrap(), 0);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_load_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut cache = Cache::new();

        assert_eq!(cache.load_dir(Some(dir.path()), "1.0").unwrap(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("1.0"),
            "good=1\nno separator\n\nempty=\nnested=a=b\n=anon\n",
        )
        .unwrap();

        let mut cache = Cache::new();
        let loaded = cache.load_dir(Some(dir.path()), "1.0").unwrap();

        assert_eq!(loaded, 3);
        assert_eq!(cache.get("good"), Some("1"));
        assert_eq!(cache.get("nested=a"), Some("b"));
        assert_eq!(cache.get(""), Some("anon"));
        assert!(!cache.contains("empty"));
        assert_eq!(cache.stats().lines_skipped, 3);
    }

    #[test]
    fn test_load_skips_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let mut bytes = b"a=1\n".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'=', b'x', b'\n']);
        bytes.extend_from_slice(b"b=2");
        fs::write(dir.path().join("v"), bytes).unwrap();

        let mut cache = Cache::new();
        assert_eq!(cache.load_dir(Some(dir.path()), "v").unwrap(), 2);
        assert_eq!(cache.get("a"), Some("1"));
        assert_eq!(cache.get("b"), Some("2"));
    }

    #[test]
    fn test_load_later_lines_win_and_merge() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.0"), "k=first\nk=second\n").unwrap();

        let mut cache = Cache::new();
        cache.set("k", "memory");
        cache.set("other", "kept");
        cache.load_dir(Some(dir.path()), "1.0").unwrap();

        assert_eq!(cache.get("k"), Some("second"));
        assert_eq!(cache.get("other"), Some("kept"));
    }

    #[test]
    fn test_load_does_not_check_scoped_paths() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.0"), "/no/such/file'count=9\n").unwrap();

        let mut cache = Cache::new();
        cache.load_dir(Some(dir.path()), "1.0").unwrap();
        assert_eq!(cache.get_file("/no/such/file", "count"), Some("9"));
    }

    #[test]
    fn test_save_without_directory_is_noop() {
        let mut cache = Cache::new();
        cache.set("a", "1");
        assert_eq!(cache.save_dir(None, "1.0").unwrap(), 0);
    }

    #[test]
    fn test_save_writes_key_value_lines() {
        let dir = TempDir::new().unwrap();
        let mut cache = Cache::new();
        cache.set("a", "1");
        cache.set("b", "2");

        assert_eq!(cache.save_dir(Some(dir.path()), "1.0").unwrap(), 2);
        assert_eq!(read_lines(&dir.path().join("1.0")), vec!["a=1", "b=2"]);
        assert!(!dir.path().join(".1.0.tmp").exists());
    }

    #[test]
    fn test_save_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.0"), "old=1\nolder=2\n").unwrap();

        let mut cache = Cache::new();
        cache.set("new", "3");
        cache.save_dir(Some(dir.path()), "1.0").unwrap();

        assert_eq!(read_lines(&dir.path().join("1.0")), vec!["new=3"]);
    }

    #[test]
    fn test_save_drops_scoped_entries_for_missing_paths() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("inbox");
        fs::write(&present, "").unwrap();
        let missing = dir.path().join("deleted");

        let mut cache = Cache::new();
        cache.set_file(present.to_str().unwrap(), "count", "5");
        cache.set_file(missing.to_str().unwrap(), "count", "6");
        cache.set("plain", "7");

        let saved = cache.save_dir(Some(dir.path()), "1.0").unwrap();

        assert_eq!(saved, 2);
        let lines = read_lines(&dir.path().join("1.0"));
        assert!(lines.contains(&format!("{}'count=5", present.display())));
        assert!(lines.contains(&"plain=7".to_string()));
        assert_eq!(lines.len(), 2);

        // Dropped entries stay in memory
        assert_eq!(cache.get_file(missing.to_str().unwrap(), "count"), Some("6"));
        assert_eq!(cache.stats().entries_dropped, 1);
    }

    #[test]
    fn test_save_checks_path_before_last_delimiter() {
        let fs_fake = FakeFs::new(&[Path::new("/mail/o'brien")]);
        let dir = TempDir::new().unwrap();

        let mut cache = Cache::new();
        cache.set_file("/mail/o'brien", "count", "1");
        cache.set_file("/mail/o", "brien", "2");

        cache.save_dir_with(Some(dir.path()), "v", &fs_fake).unwrap();

        let lines = read_lines(&dir.path().join("v"));
        assert_eq!(lines, vec!["/mail/o'brien'count=1"]);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        let fs_fake = FakeFs::new(&[]);

        let mut cache = Cache::new();
        cache.set("a", "1");
        cache.save_dir_with(Some(&cache_dir), "1.0", &fs_fake).unwrap();

        assert_eq!(fs_fake.created.borrow().as_slice(), &[cache_dir.clone()]);
        assert!(cache_dir.join("1.0").is_file());
    }

    #[test]
    fn test_save_does_not_create_parents() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("a").join("b");

        let mut cache = Cache::new();
        cache.set("a", "1");
        let err = cache.save_dir(Some(&cache_dir), "1.0").unwrap_err();

        assert!(matches!(err, CacheError::Io { .. }));
        assert!(!cache_dir.exists());
    }

    #[test]
    fn test_failed_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("1.0"), "old=1\n").unwrap();
        // A directory squatting on the temp name makes File::create fail
        fs::create_dir(dir.path().join(".1.0.tmp")).unwrap();

        let mut cache = Cache::new();
        cache.set("new", "2");
        assert!(cache.save_dir(Some(dir.path()), "1.0").is_err());

        assert_eq!(read_lines(&dir.path().join("1.0")), vec!["old=1"]);
    }

    #[test]
    fn test_load_and_save_through_config() {
        let dir = TempDir::new().unwrap();
        let mut config = HashMap::new();
        config.insert(
            CACHE_PREFIX_KEY.to_string(),
            dir.path().to_str().unwrap().to_string(),
        );
        config.insert(VERSION_KEY.to_string(), "3.1".to_string());

        let mut cache = Cache::new();
        cache.set("folder", "12");
        assert_eq!(cache.save(&config).unwrap(), 1);
        assert!(dir.path().join("3.1").is_file());

        let mut fresh = Cache::new();
        assert_eq!(fresh.load(&config).unwrap(), 1);
        assert_eq!(fresh.get("folder"), Some("12"));
    }

    #[test]
    fn test_missing_version_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut config = HashMap::new();
        config.insert(
            CACHE_PREFIX_KEY.to_string(),
            dir.path().to_str().unwrap().to_string(),
        );

        let mut cache = Cache::new();
        cache.set("a", "1");
        assert_eq!(cache.save(&config).unwrap(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
