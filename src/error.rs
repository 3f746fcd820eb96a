//! Error types for the freqcache library.
//!
//! ## Key Components
//!
//! - [`LoadError`]: Returned by loader collaborators passed to
//!   [`ByteBudgetCache::get_or_load`](crate::cache::byte_budget::ByteBudgetCache::get_or_load).
//!   The cache never produces or rewrites these; it only forwards them.
//! - [`InvariantError`]: Returned by `check_invariants` methods when internal
//!   bookkeeping disagrees with itself.
//!
//! ## Example Usage
//!
//! ```
//! use freqcache::cache::byte_budget::ByteBudgetCache;
//! use freqcache::config::ByteBudgetConfig;
//! use freqcache::error::LoadError;
//!
//! let cache: ByteBudgetCache<u32, Vec<u8>> = ByteBudgetCache::new(ByteBudgetConfig::new(1024));
//! let err = cache.get_or_load(&1, |_| Err(LoadError::NotFound)).unwrap_err();
//! assert!(err.is_not_found());
//! assert_eq!(cache.cached_count(), 0);
//! ```

use std::io;

use thiserror::Error;

// ---------------------------------------------------------------------------
// LoadError
// ---------------------------------------------------------------------------

/// Failure reported by a loader while fetching a value on a cache miss.
///
/// Loader failures leave the cache untouched: nothing is inserted and no
/// byte accounting changes.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The resource does not exist.
    #[error("resource not found")]
    NotFound,

    /// The resource exists but cannot be read as the expected kind
    /// (e.g. a directory where a regular file was expected).
    #[error("resource exists but is not readable as the expected kind")]
    NotReadable,

    /// Reading the resource failed.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] io::Error),

    /// The resource exceeds the largest size the loader can represent.
    #[error("resource too large to load")]
    TooLarge,
}

impl LoadError {
    /// Returns `true` for [`LoadError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal cache invariants are violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- LoadError ----------------------------------------------------------

    #[test]
    fn load_error_display() {
        assert_eq!(LoadError::NotFound.to_string(), "resource not found");
        assert!(LoadError::TooLarge.to_string().contains("too large"));
        assert!(LoadError::NotReadable.to_string().contains("not readable"));
    }

    #[test]
    fn load_error_from_io_keeps_source() {
        let io = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: LoadError = io.into();
        assert!(matches!(err, LoadError::IoFailure(_)));
        assert!(err.to_string().contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn load_error_is_not_found() {
        assert!(LoadError::NotFound.is_not_found());
        assert!(!LoadError::TooLarge.is_not_found());
    }

    // -- InvariantError -----------------------------------------------------

    #[test]
    fn invariant_display_shows_message() {
        let err = InvariantError::new("bucket length mismatch");
        assert_eq!(err.to_string(), "bucket length mismatch");
        assert!(format!("{:?}", err).contains("bucket length mismatch"));
    }

    #[test]
    fn errors_implement_std_error() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<LoadError>();
        assert_error::<InvariantError>();
    }
}
