//! Where cleaned pages are written.
//!
//! [`FsStorage`] writes into a directory tree. Implement [`Storage`] to send
//! output elsewhere, for example into memory in tests.

mod fs;

use std::future::Future;
use std::path::Path;

pub use fs::FsStorage;

use crate::error::Result;

/// Trait for output backends.
///
/// Keys are `/`-separated paths relative to the backend's root.
///
/// # Implementing a custom backend
///
/// ```rust,no_run
/// use std::path::Path;
/// use snapshot_cleaner::{Result, Storage};
///
/// struct NullStorage;
///
/// impl Storage for NullStorage {
///     async fn put(&self, _key: &str, _content: &[u8]) -> Result<()> {
///         Ok(())
///     }
///
///     async fn mirror_dir(&self, _key: &str, _source: &Path) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Storage: Send + Sync + 'static {
    /// Persist `content` under `key`, creating intermediate directories and
    /// overwriting any previous content.
    fn put(&self, key: &str, content: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Copy the directory `source` wholesale to `key`. An existing destination
    /// is replaced, not merged.
    fn mirror_dir(&self, key: &str, source: &Path) -> impl Future<Output = Result<()>> + Send;
}
