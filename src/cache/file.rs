//! File contents cache.
//!
//! [`FileCache`] keeps the bytes of frequently read files in memory under a
//! total byte budget. Files larger than the per-entry ceiling are read and
//! returned on every call but never cached.
//!
//! ```
//! use std::io::Write;
//! use freqcache::cache::file::FileCache;
//!
//! let mut file = tempfile::NamedTempFile::new().unwrap();
//! file.write_all(b"hello").unwrap();
//!
//! let cache = FileCache::new(1024);
//! assert_eq!(cache.read(file.path()).unwrap().as_slice(), b"hello");
//! assert_eq!(cache.cached_count(), 1);
//! assert_eq!(cache.used_size(), 5);
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::byte_budget::ByteBudgetCache;
use crate::config::ByteBudgetConfig;
use crate::error::LoadError;
use crate::metrics::CacheMetricsSnapshot;

/// Largest file length [`read_file_bytes`] will load.
pub const MAX_FILE_LEN: u64 = isize::MAX as u64;

/// Reads a whole regular file.
///
/// Maps a missing path to [`LoadError::NotFound`], anything that is not a
/// regular file to [`LoadError::NotReadable`], and a length above
/// [`MAX_FILE_LEN`] to [`LoadError::TooLarge`].
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(LoadError::NotFound),
        Err(err) => return Err(err.into()),
    };
    if !metadata.is_file() {
        return Err(LoadError::NotReadable);
    }
    if metadata.len() > MAX_FILE_LEN {
        return Err(LoadError::TooLarge);
    }
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        // Deleted between the metadata check and the read.
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(LoadError::NotFound),
        Err(err) => Err(err.into()),
    }
}

/// LFU cache of file contents keyed by path.
#[derive(Debug)]
pub struct FileCache {
    cache: ByteBudgetCache<PathBuf, Vec<u8>>,
}

impl FileCache {
    /// `capacity` bytes in total; files above `capacity / 2` are not cached.
    pub fn new(capacity: usize) -> Self {
        Self::with_config(ByteBudgetConfig::new(capacity))
    }

    /// `capacity` bytes in total; files above `max_file_size` are not cached.
    /// A `max_file_size` of 0 caches files of any size.
    pub fn with_max_file_size(capacity: usize, max_file_size: usize) -> Self {
        Self::with_config(ByteBudgetConfig::new(capacity).with_max_entry_size(max_file_size))
    }

    pub fn with_config(config: ByteBudgetConfig) -> Self {
        Self {
            cache: ByteBudgetCache::new(config),
        }
    }

    /// Returns the contents of `path`, from memory when cached.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Arc<Vec<u8>>, LoadError> {
        let path = path.as_ref().to_path_buf();
        self.cache.get_or_load(&path, |path| read_file_bytes(path))
    }

    /// Drops the cached contents of `path`, e.g. after the file changed.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> bool {
        self.cache.remove(&path.as_ref().to_path_buf()).is_some()
    }

    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn capacity(&self) -> usize {
        self.cache.capacity()
    }

    pub fn used_size(&self) -> usize {
        self.cache.used_size()
    }

    pub fn max_file_size(&self) -> usize {
        self.cache.max_entry_size()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.cached_count()
    }

    pub fn timeout(&self) -> Duration {
        self.cache.timeout()
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        self.cache.metrics()
    }

    /// The underlying byte-budget cache.
    pub fn inner(&self) -> &ByteBudgetCache<PathBuf, Vec<u8>> {
        &self.cache
    }
}
