//! Removal of elements that only make sense on the live site.

use scraper::Selector;

use super::{Pass, selector};
use crate::document::Document;
use crate::error::Result;
use crate::links::has_http_scheme;
use crate::stats::RunStatistics;

/// Removes every `<iframe>` with its subtree. Saved frames point at
/// unreachable or tracking origins and never render offline.
pub struct Iframes {
    selector: Selector,
}

impl Iframes {
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            selector: selector("iframe")?,
        })
    }
}

impl Pass for Iframes {
    fn name(&self) -> &'static str {
        "iframes"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        for id in doc.select(&self.selector) {
            if doc.remove(id) {
                stats.iframes += 1;
            }
        }
    }
}

/// Removes `<link rel="canonical">` and canonical/`og:url` `<meta>` elements
/// that point at an absolute `http(s)` URL.
pub struct CanonicalRefs {
    links: Selector,
    metas: Selector,
}

impl CanonicalRefs {
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            links: selector(r#"link[rel~="canonical"]"#)?,
            metas: selector("meta")?,
        })
    }
}

impl Pass for CanonicalRefs {
    fn name(&self) -> &'static str {
        "canonical-refs"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        for id in doc.select(&self.links) {
            let external = doc.attr(id, "href").is_some_and(has_http_scheme);
            if external && doc.remove(id) {
                stats.canonical_links += 1;
            }
        }

        for id in doc.select(&self.metas) {
            let canonical = doc.attr(id, "name") == Some("canonical")
                || doc.attr(id, "property") == Some("og:url");
            let external = doc.attr(id, "content").is_some_and(has_http_scheme);
            if canonical && external && doc.remove(id) {
                stats.meta_tags += 1;
            }
        }
    }
}
