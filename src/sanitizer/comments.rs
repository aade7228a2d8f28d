//! Vendor comment filtering.

use std::sync::Arc;

use ego_tree::NodeId;

use super::Pass;
use crate::config::TrackingSignature;
use crate::document::Document;
use crate::stats::RunStatistics;

/// Removes comments carrying a page-capture marker (for example the
/// `Page saved with SingleFile` banner). Author comments are left alone.
pub struct VendorComments {
    signature: Arc<TrackingSignature>,
}

impl VendorComments {
    pub fn new(signature: Arc<TrackingSignature>) -> Self {
        Self { signature }
    }
}

impl Pass for VendorComments {
    fn name(&self) -> &'static str {
        "vendor-comments"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        let doomed: Vec<NodeId> = doc
            .comments()
            .into_iter()
            .filter(|(_, text)| self.signature.is_vendor_comment(text))
            .map(|(id, _)| id)
            .collect();

        for id in doomed {
            if doc.remove(id) {
                stats.comments += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::Format;

    fn run(html: &str, signature: TrackingSignature) -> (String, RunStatistics) {
        let mut doc = Document::parse(html);
        let mut stats = RunStatistics::default();
        VendorComments::new(Arc::new(signature)).apply(&mut doc, &mut stats);
        (doc.serialize(Format::Preserve), stats)
    }

    #[test]
    fn removes_every_marker_variant() {
        let html = concat!(
            "<html><head><!-- Page saved with SingleFile --></head><body>",
            "<!-- saved date: Tue Mar 05 2024 -->",
            "<!--SingleFile-->",
            "<!-- header: sticky -->",
            "</body></html>",
        );
        let (out, stats) = run(html, TrackingSignature::default());
        assert_eq!(stats.comments, 3);
        assert_eq!(
            out,
            "<html><head></head><body><!-- header: sticky --></body></html>"
        );
    }

    #[test]
    fn custom_markers_replace_defaults() {
        let signature = TrackingSignature {
            comment_markers: vec!["WebScrapBook".into()],
            ..TrackingSignature::default()
        };
        let html = "<p>a</p><!-- WebScrapBook capture --><!-- Page saved with SingleFile -->";
        let (out, stats) = run(html, signature);
        assert_eq!(stats.comments, 1);
        assert!(!out.contains("WebScrapBook"));
        assert!(out.contains("SingleFile"));
    }

    #[test]
    fn no_markers_means_no_changes() {
        let html = "<html><head></head><body><!-- layout: two columns --><p>x</p></body></html>";
        let (out, stats) = run(html, TrackingSignature::default());
        assert_eq!(stats.comments, 0);
        assert_eq!(out, html);
    }
}
