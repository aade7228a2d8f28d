//! Rewriting of internal references so a cleaned tree links to itself.
//!
//! Every `href` on `<a>` and `<link>` and every `src` on `<script>` is
//! classified with [`classify`]. External references are never touched;
//! internal ones go through [`LinkRewriter::rewrite_value`].

use std::borrow::Cow;

use scraper::Selector;

use crate::config::LinkConfig;
use crate::document::Document;
use crate::error::Result;
use crate::sanitizer::{Pass, Processed, Transform, run_passes, selector};
use crate::serialize::Format;
use crate::stats::RunStatistics;

/// Returns `true` if `value` starts with `http://` or `https://`.
pub fn has_http_scheme(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Kind of a reference that resolves inside the archived tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InternalKind {
    /// `#fragment`, `./x` or `../x`.
    AlreadyRelative,
    /// Begins with `/`.
    Rooted,
    /// Ends in `.html`/`.htm`, or its last segment has no extension.
    PathLike,
    /// Anything else without an `http(s)` scheme, e.g. `img.png` or
    /// `mailto:` links. Still internal.
    Asset,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkClass {
    Internal(InternalKind),
    External,
}

/// Classify a raw attribute value. Empty values are not links.
pub fn classify(value: &str) -> Option<LinkClass> {
    if value.is_empty() {
        return None;
    }
    if value.starts_with('#') || value.starts_with("./") || value.starts_with("../") {
        return Some(LinkClass::Internal(InternalKind::AlreadyRelative));
    }
    if has_http_scheme(value) {
        return Some(LinkClass::External);
    }

    let kind = if value.starts_with('/') {
        InternalKind::Rooted
    } else if is_html_path(value) || !has_extension(value) {
        InternalKind::PathLike
    } else {
        InternalKind::Asset
    };
    Some(LinkClass::Internal(kind))
}

pub fn is_internal(value: &str) -> bool {
    matches!(classify(value), Some(LinkClass::Internal(_)))
}

fn is_html_path(value: &str) -> bool {
    value.ends_with(".html") || value.ends_with(".htm")
}

fn has_extension(value: &str) -> bool {
    value.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

/// Retargets internal references from the source tree to the destination
/// tree, and turns root-absolute page links into directory-relative ones.
pub struct LinkRewriter {
    /// `/<source>/` and `/<dest>/`.
    source_segment: String,
    dest_segment: String,
    /// `<source>/` and `<dest>/`, matched at the start of a value.
    source_prefix: String,
    dest_prefix: String,
    targets: Vec<(Selector, &'static str)>,
}

impl LinkRewriter {
    pub fn new(config: &LinkConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source_segment: format!("/{}/", config.source_root_name),
            dest_segment: format!("/{}/", config.dest_root_name),
            source_prefix: format!("{}/", config.source_root_name),
            dest_prefix: format!("{}/", config.dest_root_name),
            targets: vec![
                (selector("a[href]")?, "href"),
                (selector("link[href]")?, "href"),
                (selector("script[src]")?, "src"),
            ],
        })
    }

    /// New value for one reference, or `None` if it stays as it is.
    ///
    /// The value is percent-decoded before any rule is checked; a rewritten
    /// value is written back decoded. Rules, first match wins:
    ///
    /// 1. contains the source root segment: swap it for the destination root;
    /// 2. a bare `page.html`: unchanged;
    /// 3. a root-absolute `/page.html`: prefixed with `.`;
    /// 4. anything else: unchanged.
    pub fn rewrite_value(&self, value: &str) -> Option<String> {
        if !is_internal(value) {
            return None;
        }
        let decoded = urlencoding::decode(value).unwrap_or(Cow::Borrowed(value));

        if let Some(retargeted) = self.retarget(&decoded) {
            return Some(retargeted);
        }
        if is_html_path(&decoded) && !decoded.contains('/') {
            return None;
        }
        if decoded.starts_with('/') && is_html_path(&decoded) {
            return Some(format!(".{decoded}"));
        }
        None
    }

    fn retarget(&self, decoded: &str) -> Option<String> {
        let (lead, rest) = match decoded.strip_prefix(self.source_prefix.as_str()) {
            Some(rest) => (self.dest_prefix.as_str(), rest),
            None if decoded.contains(self.source_segment.as_str()) => ("", decoded),
            None => return None,
        };
        Some(format!(
            "{lead}{}",
            rest.replace(self.source_segment.as_str(), &self.dest_segment)
        ))
    }

    /// Rewrite every reference in `html`. Output is always pretty-printed.
    pub fn rewrite(&self, html: &str) -> Processed {
        run_passes(html, Format::Pretty, |doc, stats| self.apply(doc, stats))
    }
}

impl Pass for LinkRewriter {
    fn name(&self) -> &'static str {
        "link-rewriter"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        for (selector, attr) in &self.targets {
            for id in doc.select(selector) {
                let Some(value) = doc.attr(id, attr) else {
                    continue;
                };
                stats.links_examined += 1;
                let Some(rewritten) = self.rewrite_value(value) else {
                    continue;
                };
                tracing::debug!(from = value, to = %rewritten, "link rewritten");
                doc.set_attr(id, attr, rewritten);
                stats.links_rewritten += 1;
            }
        }
    }
}

impl Transform for LinkRewriter {
    fn transform(&self, html: &str) -> Processed {
        self.rewrite(html)
    }
}
