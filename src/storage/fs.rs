//! Filesystem storage backend.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::{CleanerError, Result};
use crate::storage::Storage;

/// Storage backend that writes files under a base directory.
///
/// Intermediate directories are created on demand; creating one that already
/// exists is not an error.
///
/// # Example
///
/// ```rust,no_run
/// use snapshot_cleaner::FsStorage;
///
/// let storage = FsStorage::new("clean");
/// ```
pub struct FsStorage {
    base_dir: PathBuf,
}

impl FsStorage {
    /// Create a new `FsStorage` rooted at the given directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Create the base directory so it exists even when nothing is written.
    pub async fn ensure_base_dir(&self) -> Result<()> {
        create_dir_all(&self.base_dir).await
    }
}

async fn create_dir_all(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| CleanerError::io(path, e))
}

/// Walk `source` on the blocking pool, parents before children.
async fn list_tree(source: PathBuf) -> Result<Vec<DirEntry>> {
    let root = source.clone();
    tokio::task::spawn_blocking(move || {
        WalkDir::new(&source)
            .into_iter()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| {
                let path = e.path().unwrap_or(source.as_path()).to_path_buf();
                CleanerError::io(path, e.into())
            })
    })
    .await
    .map_err(|e| CleanerError::io(root, std::io::Error::other(e)))?
}

impl Storage for FsStorage {
    async fn put(&self, key: &str, content: &[u8]) -> Result<()> {
        let path = self.base_dir.join(key);

        if let Some(parent) = path.parent() {
            create_dir_all(parent).await?;
        }

        tokio::fs::write(&path, content)
            .await
            .map_err(|e| CleanerError::io(&path, e))?;

        tracing::debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    async fn mirror_dir(&self, key: &str, source: &Path) -> Result<()> {
        let dest = self.base_dir.join(key);

        let entries = list_tree(source.to_path_buf()).await?;

        match tokio::fs::remove_dir_all(&dest).await {
            Ok(()) => tracing::debug!("Replacing existing {}", dest.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CleanerError::io(&dest, e)),
        }

        for entry in entries {
            let Ok(relative) = entry.path().strip_prefix(source) else {
                continue;
            };
            let target = dest.join(relative);
            if entry.file_type().is_dir() {
                create_dir_all(&target).await?;
            } else {
                tokio::fs::copy(entry.path(), &target)
                    .await
                    .map_err(|e| CleanerError::io(entry.path(), e))?;
            }
        }

        tracing::debug!("Mirrored {} to {}", source.display(), dest.display());
        Ok(())
    }
}
