//! Merging of inline style blocks.

use scraper::Selector;

use super::{Pass, selector};
use crate::document::{Document, Injected};
use crate::error::Result;
use crate::stats::RunStatistics;

/// Collects every `<style>` block in document order, removes them, and
/// inserts a single merged `<style>` as the first child of `<head>`.
///
/// Blocks are joined with a newline. When the document has no `<head>`, one
/// is synthesized as the first child of `<html>`.
pub struct StyleConsolidation {
    selector: Selector,
}

impl StyleConsolidation {
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            selector: selector("style")?,
        })
    }
}

impl Pass for StyleConsolidation {
    fn name(&self) -> &'static str {
        "style-consolidation"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        let blocks = doc.select(&self.selector);
        if blocks.is_empty() {
            return;
        }

        let css: Vec<String> = blocks.iter().map(|id| doc.text(*id)).collect();
        let merged = Injected::new("style", css.join("\n"));

        if let Some(head) = doc.first_element("head") {
            doc.prepend(head, merged);
        } else if let Some(html) = doc.first_element("html") {
            doc.prepend(html, Injected::new("head", "").with_child(merged));
        } else {
            tracing::warn!(blocks = css.len(), "no <html> element, style blocks left in place");
            return;
        }

        for id in blocks {
            doc.remove(id);
        }
        stats.styles_merged += css.len();
    }
}
