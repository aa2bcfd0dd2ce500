//! Filesystem Module
//!
//! The two filesystem questions the cache asks, behind a trait so tests can
//! answer them without touching disk.

use std::io;
use std::path::Path;

/// Filesystem capability consumed by load/save.
pub trait Filesystem {
    /// Returns true if `path` currently exists.
    fn path_exists(&self, path: &Path) -> bool;

    /// Creates a single directory. Parents are not created.
    fn make_directory(&self, path: &Path) -> io::Result<()>;
}

/// [`Filesystem`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn make_directory(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }
}
