//! Error types for the `snapshot_cleaner` crate.

use std::path::PathBuf;

/// All errors that can occur while cleaning or relinking a snapshot tree.
///
/// Malformed HTML is never an error: the parser recovers on its own.
#[derive(Debug, thiserror::Error)]
pub enum CleanerError {
    /// An input file or root directory does not exist.
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Reading, writing or copying failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration is invalid or could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// A CSS selector failed to compile.
    #[error("Selector error: {0}")]
    Selector(String),
}

impl CleanerError {
    /// Wrap an I/O error with the path it happened at. `NotFound` errors are
    /// promoted to [`CleanerError::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

/// A type alias for `Result<T, CleanerError>`.
pub type Result<T> = std::result::Result<T, CleanerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_is_promoted() {
        let err = CleanerError::io(
            "/tmp/missing.html",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, CleanerError::NotFound(_)));
        assert!(err.to_string().contains("missing.html"));
    }

    #[test]
    fn io_other_kinds_keep_source() {
        let err = CleanerError::io(
            "/root/out.html",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, CleanerError::Io { .. }));
    }
}
