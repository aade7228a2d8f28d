//! # snapshot_cleaner
//!
//! Cleans trees of locally saved HTML pages so they render offline exactly as
//! captured, without the tracking side effects of the live site.
//!
//! ## Overview
//!
//! Two independent passes run over a directory tree, one file at a time:
//!
//! 1. The [`Sanitizer`] removes page-capture comments, iframes, canonical
//!    references to the live site and, optionally, vendor tracking attributes
//!    and classes, and merges inline `<style>` blocks. Output mirrors the input
//!    tree into a separate root, with each page's `<stem>_files/` asset folder
//!    copied alongside.
//! 2. The [`LinkRewriter`] points internal references that still name the
//!    source root at the destination root instead, in place.
//!
//! Both are driven by [`batch::sanitize_tree`] and [`batch::rewrite_tree`]
//! and configured through [`AppConfig`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use snapshot_cleaner::{AppConfig, FsStorage, LinkRewriter, Sanitizer, batch};
//!
//! # async fn example() -> snapshot_cleaner::Result<()> {
//! let config = AppConfig::load(None)?;
//! let sanitizer = Sanitizer::from_config(&config.sanitizer, Arc::new(config.signature.clone()))?;
//!
//! let out = FsStorage::new("clean");
//! let report = batch::sanitize_tree(Path::new("original"), &out, &sanitizer, &config.batch).await?;
//! assert!(report.is_success());
//!
//! let rewriter = LinkRewriter::new(&config.links)?;
//! batch::rewrite_tree(Path::new("clean"), &out, &rewriter, &config.batch).await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod links;
pub mod logging;
pub mod sanitizer;
pub mod serialize;
pub mod stats;
pub mod storage;

pub use batch::{BatchReport, FileFailure, FileReport};
pub use config::{AppConfig, BatchConfig, LinkConfig, SanitizerConfig, TrackingSignature};
pub use document::Document;
pub use error::{CleanerError, Result};
pub use links::{InternalKind, LinkClass, LinkRewriter, classify, is_internal};
pub use sanitizer::{Pass, Processed, Sanitizer, Transform};
pub use serialize::Format;
pub use stats::RunStatistics;
pub use storage::{FsStorage, Storage};
