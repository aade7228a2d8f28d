//! Batch driver: walk a directory tree and run a [`Transform`] over every page.
//!
//! Each file is read, transformed and written before it is forgotten; nothing
//! is shared between files except the read-only pipeline. A failing file is
//! recorded in the [`BatchReport`] and the batch moves on. Files already
//! written by a batch that later fails stay on disk.

use std::path::{Path, PathBuf};

use futures::{StreamExt, stream};
use walkdir::WalkDir;

use crate::config::BatchConfig;
use crate::error::{CleanerError, Result};
use crate::sanitizer::Transform;
use crate::stats::{RunStatistics, reduction_percent};
use crate::storage::Storage;

/// Outcome of one successfully processed file.
#[derive(Clone, Debug)]
pub struct FileReport {
    /// Path relative to the batch root.
    pub path: PathBuf,
    pub stats: RunStatistics,
    pub bytes_in: u64,
    pub bytes_out: u64,
    /// Whether a `<stem>_files/` folder was copied next to the output.
    pub asset_dir_copied: bool,
}

impl FileReport {
    pub fn reduction_percent(&self) -> f64 {
        reduction_percent(self.bytes_in, self.bytes_out)
    }
}

/// A file (or directory, for walk errors) that could not be processed.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: CleanerError,
}

/// Aggregate result of a batch run. Report order follows discovery order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
    pub failures: Vec<FileFailure>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.files.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// `true` when no file failed. An empty batch is a success.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Counters summed over every processed file.
    pub fn totals(&self) -> RunStatistics {
        let mut totals = RunStatistics::default();
        for file in &self.files {
            totals += file.stats;
        }
        totals
    }

    pub fn assets_copied(&self) -> usize {
        self.files.iter().filter(|f| f.asset_dir_copied).count()
    }

    pub fn bytes_in(&self) -> u64 {
        self.files.iter().map(|f| f.bytes_in).sum()
    }

    pub fn bytes_out(&self) -> u64 {
        self.files.iter().map(|f| f.bytes_out).sum()
    }
}

/// Files found under a root, plus the entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    /// Paths relative to the root, sorted by file name at each level.
    pub files: Vec<PathBuf>,
    pub failures: Vec<FileFailure>,
}

/// Recursively list the files under `root` whose name matches
/// `config.file_pattern`.
///
/// With `skip_asset_dirs`, a `<stem><asset_suffix>` directory that sits next
/// to `<stem>.html` is not descended into: it is copied wholesale instead.
pub fn discover(root: &Path, config: &BatchConfig, skip_asset_dirs: bool) -> Result<Discovery> {
    let metadata = std::fs::metadata(root).map_err(|e| CleanerError::io(root, e))?;
    if !metadata.is_dir() {
        return Err(CleanerError::io(
            root,
            std::io::Error::from(std::io::ErrorKind::NotADirectory),
        ));
    }

    let pattern = config.file_regex()?;
    let mut discovery = Discovery::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(skip_asset_dirs
                && entry.depth() > 0
                && entry.file_type().is_dir()
                && is_asset_dir(entry.path(), &config.asset_suffix))
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                tracing::warn!("Skipping unreadable entry {}: {e}", path.display());
                discovery.failures.push(FileFailure {
                    error: CleanerError::io(&path, e.into()),
                    path,
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !pattern.is_match(&entry.file_name().to_string_lossy()) {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            discovery.files.push(relative.to_path_buf());
        }
    }

    Ok(discovery)
}

/// Whether `dir` is the asset folder of a sibling page (`a_files/` next to
/// `a.html` or `a.htm`).
fn is_asset_dir(dir: &Path, suffix: &str) -> bool {
    let Some(stem) = dir
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(suffix))
    else {
        return false;
    };
    if stem.is_empty() {
        return false;
    }
    ["html", "htm"]
        .iter()
        .any(|ext| dir.with_file_name(format!("{stem}.{ext}")).is_file())
}

/// `/`-separated storage key for a relative path.
fn storage_key(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Sanitize every page under `input` into `storage`, mirroring the directory
/// layout and copying each page's asset folder alongside it.
///
/// Fails only if `input` is missing or the config is invalid; per-file errors
/// end up in the report.
pub async fn sanitize_tree<S: Storage, T: Transform>(
    input: &Path,
    storage: &S,
    sanitizer: &T,
    config: &BatchConfig,
) -> Result<BatchReport> {
    config.validate()?;
    let discovery = discover(input, config, true)?;
    tracing::info!(
        "Found {} HTML files in {}",
        discovery.files.len(),
        input.display()
    );

    let mut report = run_batch(
        input,
        discovery.files,
        storage,
        sanitizer,
        Some(config.asset_suffix.as_str()),
        config.concurrency,
    )
    .await;
    let mut failures = discovery.failures;
    failures.append(&mut report.failures);
    report.failures = failures;
    Ok(report)
}

/// Rewrite every page under `target`, writing each result to `storage` under
/// the same relative path. With an [`FsStorage`](crate::FsStorage) rooted at
/// `target` this rewrites the tree in place.
pub async fn rewrite_tree<S: Storage, T: Transform>(
    target: &Path,
    storage: &S,
    rewriter: &T,
    config: &BatchConfig,
) -> Result<BatchReport> {
    config.validate()?;
    let discovery = discover(target, config, false)?;
    tracing::info!(
        "Found {} HTML files in {}",
        discovery.files.len(),
        target.display()
    );

    let mut report = run_batch(
        target,
        discovery.files,
        storage,
        rewriter,
        None,
        config.concurrency,
    )
    .await;
    let mut failures = discovery.failures;
    failures.append(&mut report.failures);
    report.failures = failures;
    Ok(report)
}

async fn run_batch<S: Storage, T: Transform>(
    root: &Path,
    files: Vec<PathBuf>,
    storage: &S,
    transform: &T,
    asset_suffix: Option<&str>,
    concurrency: usize,
) -> BatchReport {
    let results: Vec<(PathBuf, Result<FileReport>)> = stream::iter(files)
        .map(|relative| async move {
            let result = process_file(root, &relative, storage, transform, asset_suffix).await;
            (relative, result)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(file) => {
                tracing::info!(
                    changes = file.stats.changes(),
                    links_rewritten = file.stats.links_rewritten,
                    "{}: {} -> {} bytes ({:.1}% reduction)",
                    file.path.display(),
                    file.bytes_in,
                    file.bytes_out,
                    file.reduction_percent(),
                );
                tracing::debug!(stats = ?file.stats, "{}", file.path.display());
                report.files.push(file);
            }
            Err(error) => {
                tracing::warn!("Failed to process {}: {error}", path.display());
                report.failures.push(FileFailure { path, error });
            }
        }
    }
    report
}

async fn process_file<S: Storage, T: Transform>(
    root: &Path,
    relative: &Path,
    storage: &S,
    transform: &T,
    asset_suffix: Option<&str>,
) -> Result<FileReport> {
    let path = root.join(relative);
    let raw = tokio::fs::read(&path)
        .await
        .map_err(|e| CleanerError::io(&path, e))?;
    let processed = transform.transform(&String::from_utf8_lossy(&raw));

    storage
        .put(&storage_key(relative), processed.html.as_bytes())
        .await?;

    let mut asset_dir_copied = false;
    if let Some(suffix) = asset_suffix {
        if let Some(dir_name) = asset_dir_name(&path, suffix).await {
            let source = path.with_file_name(&dir_name);
            let key = storage_key(&relative.with_file_name(&dir_name));
            storage.mirror_dir(&key, &source).await?;
            tracing::info!("Copied asset folder {}", source.display());
            asset_dir_copied = true;
        }
    }

    Ok(FileReport {
        path: relative.to_path_buf(),
        stats: processed.stats,
        bytes_in: raw.len() as u64,
        bytes_out: processed.html.len() as u64,
        asset_dir_copied,
    })
}

/// Name of the page's asset folder, if one exists next to it.
async fn asset_dir_name(page: &Path, suffix: &str) -> Option<String> {
    let stem = page.file_stem()?.to_str()?;
    let name = format!("{stem}{suffix}");
    let metadata = tokio::fs::metadata(page.with_file_name(&name)).await.ok()?;
    metadata.is_dir().then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "<p>x</p>").unwrap();
    }

    #[test]
    fn storage_key_uses_forward_slashes() {
        assert_eq!(storage_key(Path::new("a/b/c.html")), "a/b/c.html");
        assert_eq!(storage_key(Path::new("c.html")), "c.html");
    }

    #[test]
    fn discover_finds_html_recursively_in_name_order() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.html");
        touch(tmp.path(), "a.htm");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "blog/2024/post.html");

        let discovery = discover(tmp.path(), &BatchConfig::default(), true).unwrap();
        assert_eq!(
            discovery.files,
            vec![
                PathBuf::from("a.htm"),
                PathBuf::from("b.html"),
                PathBuf::from("blog/2024/post.html"),
            ]
        );
        assert!(discovery.failures.is_empty());
    }

    #[test]
    fn asset_dirs_skipped_only_when_asked() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "page.html");
        touch(tmp.path(), "page_files/frame.html");
        touch(tmp.path(), "orphan_files/inner.html");

        let skipped = discover(tmp.path(), &BatchConfig::default(), true).unwrap();
        assert_eq!(
            skipped.files,
            vec![
                PathBuf::from("orphan_files/inner.html"),
                PathBuf::from("page.html"),
            ]
        );

        let all = discover(tmp.path(), &BatchConfig::default(), false).unwrap();
        assert_eq!(all.files.len(), 3);
    }

    #[test]
    fn discover_missing_root_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = discover(&tmp.path().join("nope"), &BatchConfig::default(), true).unwrap_err();
        assert!(matches!(err, CleanerError::NotFound(_)));
    }

    #[test]
    fn discover_file_root_is_io_error() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "single.html");
        let err = discover(&tmp.path().join("single.html"), &BatchConfig::default(), true)
            .unwrap_err();
        assert!(matches!(err, CleanerError::Io { .. }));
    }

    #[test]
    fn empty_report_is_success() {
        let report = BatchReport::default();
        assert!(report.is_success());
        assert_eq!(report.processed(), 0);
        assert_eq!(report.totals(), RunStatistics::default());
    }
}
