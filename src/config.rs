//! Runtime configuration for the sanitizer, the link rewriter and the batch
//! driver.
//!
//! Everything can be loaded from a single TOML file. Missing sections and
//! fields fall back to defaults, so an empty file is a valid configuration.
//!
//! ```toml
//! [sanitizer]
//! preserve_formatting = false
//! consolidate_styles = true
//!
//! [signature]
//! classes = ["js-evernote-checked", "hs-tracked"]
//!
//! [links]
//! source_root_name = "raw"
//! dest_root_name = "site"
//! ```

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CleanerError, Result};
use crate::serialize::Format;

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sanitizer: SanitizerConfig,

    #[serde(default)]
    pub signature: TrackingSignature,

    #[serde(default)]
    pub links: LinkConfig,

    #[serde(default)]
    pub batch: BatchConfig,
}

impl AppConfig {
    /// Load the configuration from `path`, or return the defaults when no path
    /// is given. The result is validated before it is returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| CleanerError::io(path, e))?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from TOML text.
    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| CleanerError::Config(e.to_string()))
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.links.validate()?;
        self.batch.validate()?;
        Ok(())
    }
}

/// `[sanitizer]` section: which cleaning steps run and how output is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Keep the parsed layout instead of re-indenting the output.
    pub preserve_formatting: bool,
    pub strip_tracking_attrs: bool,
    pub strip_tracking_classes: bool,
    pub consolidate_styles: bool,
    pub remove_iframes: bool,
    pub remove_canonical: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            strip_tracking_attrs: false,
            strip_tracking_classes: false,
            consolidate_styles: false,
            remove_iframes: true,
            remove_canonical: true,
        }
    }
}

impl SanitizerConfig {
    /// Output format selected by `preserve_formatting`.
    pub fn format(&self) -> Format {
        if self.preserve_formatting {
            Format::Preserve
        } else {
            Format::Pretty
        }
    }

    pub fn preserve_formatting(mut self, enabled: bool) -> Self {
        self.preserve_formatting = enabled;
        self
    }

    /// Enable or disable both attribute and class stripping.
    pub fn strip_tracking(mut self, enabled: bool) -> Self {
        self.strip_tracking_attrs = enabled;
        self.strip_tracking_classes = enabled;
        self
    }

    pub fn consolidate_styles(mut self, enabled: bool) -> Self {
        self.consolidate_styles = enabled;
        self
    }

    pub fn remove_iframes(mut self, enabled: bool) -> Self {
        self.remove_iframes = enabled;
        self
    }

    pub fn remove_canonical(mut self, enabled: bool) -> Self {
        self.remove_canonical = enabled;
        self
    }
}

/// `[signature]` section: markers left behind by page-capture and tracking
/// tools.
///
/// Loaded once per run and shared read-only by every document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingSignature {
    /// Attribute names removed from every element.
    pub attributes: Vec<String>,
    /// Class tokens removed from every element's class list.
    pub classes: Vec<String>,
    /// A comment containing any of these substrings is removed.
    pub comment_markers: Vec<String>,
}

impl Default for TrackingSignature {
    fn default() -> Self {
        Self {
            attributes: vec![
                "data-hs-cf-bound".into(),
                "data-hs-ignore".into(),
                "data-evernote-id".into(),
            ],
            classes: vec!["js-evernote-checked".into()],
            comment_markers: vec![
                "SingleFile".into(),
                "Page saved with".into(),
                "saved date:".into(),
            ],
        }
    }
}

impl TrackingSignature {
    /// Returns `true` if the comment text carries a vendor marker.
    pub fn is_vendor_comment(&self, text: &str) -> bool {
        self.comment_markers.iter().any(|m| text.contains(m.as_str()))
    }

    pub fn is_tracking_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// `[links]` section: the directory names swapped by the link rewriter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub source_root_name: String,
    pub dest_root_name: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            source_root_name: "original".into(),
            dest_root_name: "clean".into(),
        }
    }
}

impl LinkConfig {
    pub fn new(source: impl Into<String>, dest: impl Into<String>) -> Self {
        Self {
            source_root_name: source.into(),
            dest_root_name: dest.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("source_root_name", &self.source_root_name),
            ("dest_root_name", &self.dest_root_name),
        ] {
            if value.is_empty() {
                return Err(CleanerError::Config(format!("{field} must not be empty")));
            }
            if value.contains('/') {
                return Err(CleanerError::Config(format!(
                    "{field} must be a single directory name, got {value:?}"
                )));
            }
        }
        if self.source_root_name == self.dest_root_name {
            return Err(CleanerError::Config(
                "source_root_name and dest_root_name must differ".into(),
            ));
        }
        Ok(())
    }
}

/// `[batch]` section: which files are picked up and how many are in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Regex matched against each file name.
    pub file_pattern: String,
    /// Suffix of the asset folder saved next to a page (`<stem><suffix>/`).
    pub asset_suffix: String,
    /// Number of files processed at once. `1` is strictly sequential.
    pub concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            file_pattern: r"(?i)\.html?$".into(),
            asset_suffix: "_files".into(),
            concurrency: 1,
        }
    }
}

impl BatchConfig {
    /// Compile `file_pattern`.
    pub fn file_regex(&self) -> Result<Regex> {
        Regex::new(&self.file_pattern)
            .map_err(|e| CleanerError::Config(format!("invalid file_pattern: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(CleanerError::Config("concurrency must be at least 1".into()));
        }
        if self.asset_suffix.is_empty() {
            return Err(CleanerError::Config("asset_suffix must not be empty".into()));
        }
        self.file_regex().map(|_| ())
    }
}
