//! Removal of tracking artifacts from saved pages.
//!
//! A [`Sanitizer`] is an ordered chain of [`Pass`] implementations run over a
//! single parsed [`Document`]. [`Sanitizer::from_config`] assembles the
//! built-in passes in their fixed order:
//!
//! 1. [`VendorComments`] -- comments injected by page-capture tools.
//! 2. [`Iframes`] -- every `<iframe>`, subtree included.
//! 3. [`CanonicalRefs`] -- canonical/`og:url` references to the live site.
//! 4. [`TrackingAttributes`] -- vendor data attributes.
//! 5. [`TrackingClasses`] -- vendor class tokens.
//! 6. [`StyleConsolidation`] -- all `<style>` blocks merged into one.
//!
//! Later passes assume earlier ones ran, so custom pipelines built with
//! [`Sanitizer::add`] should keep that order.

mod comments;
mod markup;
mod styles;
mod tracking;

use std::sync::Arc;

use scraper::Selector;

pub use comments::VendorComments;
pub use markup::{CanonicalRefs, Iframes};
pub use styles::StyleConsolidation;
pub use tracking::{TrackingAttributes, TrackingClasses};

use crate::config::{SanitizerConfig, TrackingSignature};
use crate::document::Document;
use crate::error::{CleanerError, Result};
use crate::serialize::Format;
use crate::stats::RunStatistics;

/// One in-place transformation of a [`Document`].
///
/// Implementations must be `Send + Sync` so a pipeline can be shared by
/// concurrently processed files.
pub trait Pass: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Apply the pass, recording what changed in `stats`.
    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics);
}

/// Raw HTML in, processed HTML out. Implemented by [`Sanitizer`] and
/// [`LinkRewriter`](crate::LinkRewriter) so the batch driver can run either.
pub trait Transform: Send + Sync {
    fn transform(&self, html: &str) -> Processed;
}

/// Result of running a [`Transform`] over one file's text.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Processed {
    pub html: String,
    pub stats: RunStatistics,
}

/// Parse `html`, let `apply` edit the document, and serialize it back.
///
/// Zero-byte input is returned as is, without a parse (which would otherwise
/// synthesize an `<html>` skeleton).
pub(crate) fn run_passes(
    html: &str,
    format: Format,
    apply: impl FnOnce(&mut Document, &mut RunStatistics),
) -> Processed {
    let mut stats = RunStatistics::default();
    if html.is_empty() {
        return Processed {
            html: String::new(),
            stats,
        };
    }
    let mut doc = Document::parse(html);
    apply(&mut doc, &mut stats);
    Processed {
        html: doc.serialize(format),
        stats,
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CleanerError::Selector(format!("{css}: {e:?}")))
}

/// An ordered chain of [`Pass`] implementations plus the output [`Format`].
///
/// Each pass sees the edits of the previous ones. An empty sanitizer still
/// re-serializes its input.
pub struct Sanitizer {
    passes: Vec<Box<dyn Pass>>,
    format: Format,
}

impl Sanitizer {
    /// Create an empty sanitizer writing `format`.
    pub fn new(format: Format) -> Self {
        Self {
            passes: Vec::new(),
            format,
        }
    }

    /// Build the standard pipeline for `config`. Disabled steps are left out;
    /// vendor comment filtering always runs.
    pub fn from_config(config: &SanitizerConfig, signature: Arc<TrackingSignature>) -> Result<Self> {
        let mut sanitizer = Self::new(config.format());
        sanitizer.add(VendorComments::new(signature.clone()));
        if config.remove_iframes {
            sanitizer.add(Iframes::try_new()?);
        }
        if config.remove_canonical {
            sanitizer.add(CanonicalRefs::try_new()?);
        }
        if config.strip_tracking_attrs {
            sanitizer.add(TrackingAttributes::new(signature.clone()));
        }
        if config.strip_tracking_classes {
            sanitizer.add(TrackingClasses::new(signature));
        }
        if config.consolidate_styles {
            sanitizer.add(StyleConsolidation::try_new()?);
        }
        Ok(sanitizer)
    }

    /// Append a pass to the end of the pipeline.
    pub fn add(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Run every pass over `html` and serialize the result.
    pub fn sanitize(&self, html: &str) -> Processed {
        run_passes(html, self.format, |doc, stats| {
            for pass in &self.passes {
                pass.apply(doc, stats);
                tracing::trace!(pass = pass.name(), "pass applied");
            }
        })
    }
}

impl Transform for Sanitizer {
    fn transform(&self, html: &str) -> Processed {
        self.sanitize(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> Arc<TrackingSignature> {
        Arc::new(TrackingSignature::default())
    }

    fn full_config() -> SanitizerConfig {
        SanitizerConfig::default()
            .strip_tracking(true)
            .consolidate_styles(true)
    }

    #[test]
    fn default_config_builds_preserve_pipeline() {
        let sanitizer = Sanitizer::from_config(&SanitizerConfig::default(), signature()).unwrap();
        assert_eq!(
            sanitizer.pass_names(),
            vec!["vendor-comments", "iframes", "canonical-refs"]
        );
        assert_eq!(sanitizer.format(), Format::Preserve);
    }

    #[test]
    fn full_config_keeps_fixed_order() {
        let sanitizer = Sanitizer::from_config(&full_config(), signature()).unwrap();
        assert_eq!(
            sanitizer.pass_names(),
            vec![
                "vendor-comments",
                "iframes",
                "canonical-refs",
                "tracking-attributes",
                "tracking-classes",
                "style-consolidation",
            ]
        );
    }

    #[test]
    fn comment_filtering_cannot_be_disabled() {
        let config = SanitizerConfig::default()
            .remove_iframes(false)
            .remove_canonical(false);
        let sanitizer = Sanitizer::from_config(&config, signature()).unwrap();
        assert_eq!(sanitizer.pass_names(), vec!["vendor-comments"]);
    }

    #[test]
    fn empty_sanitizer_is_empty() {
        assert!(Sanitizer::new(Format::Preserve).is_empty());
    }

    #[test]
    fn zero_byte_input_stays_empty() {
        let sanitizer = Sanitizer::from_config(&full_config(), signature()).unwrap();
        let out = sanitizer.sanitize("");
        assert_eq!(out.html, "");
        assert_eq!(out.stats, RunStatistics::default());
    }

    #[test]
    fn realistic_singlefile_capture() {
        let sanitizer = Sanitizer::from_config(&SanitizerConfig::default(), signature()).unwrap();
        let html = concat!(
            "<!DOCTYPE html> <html><!--\n Page saved with SingleFile \n url: https://blog.example.com/post \n saved date: Mon Jan 01 2024\n-->",
            r#"<head><link rel="canonical" href="https://blog.example.com/post">"#,
            r#"<meta property="og:url" content="https://blog.example.com/post">"#,
            r#"<meta property="og:title" content="Post"></head>"#,
            r#"<body><!-- author note --><h1>Post</h1>"#,
            r#"<iframe src="https://app.hubspot.com/frame"><p>fallback</p></iframe>"#,
            r#"<iframe src="https://evernote.com/clip"></iframe></body></html>"#,
        );
        let out = sanitizer.sanitize(html);

        assert!(!out.html.contains("SingleFile"));
        assert!(!out.html.contains("<iframe"));
        assert!(!out.html.contains("canonical"));
        assert!(!out.html.contains("og:url"));
        assert!(out.html.contains(r#"<meta property="og:title" content="Post">"#));
        assert!(out.html.contains("<!-- author note -->"));
        assert!(out.html.contains("<h1>Post</h1>"));

        assert_eq!(out.stats.comments, 1);
        assert_eq!(out.stats.iframes, 2);
        assert_eq!(out.stats.canonical_links, 1);
        assert_eq!(out.stats.meta_tags, 1);
    }

    #[test]
    fn sanitizing_twice_is_idempotent() {
        let html = concat!(
            "<!DOCTYPE html><html><head><title>Keep</title><style>p{color:red}</style></head>\n",
            "<body class=\"js-evernote-checked home\">\n",
            "  <div data-evernote-id=\"7\"><p>text &amp; more</p></div>\n",
            "  <style>h1{margin:0}</style>\n",
            "  <iframe src=\"https://t.example/x\"></iframe>\n",
            "</body></html>",
        );
        for config in [SanitizerConfig::default(), full_config(), full_config().preserve_formatting(false)] {
            let sanitizer = Sanitizer::from_config(&config, signature()).unwrap();
            let once = sanitizer.sanitize(html).html;
            let twice = sanitizer.sanitize(&once).html;
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn preserve_mode_keeps_untouched_structure() {
        let sanitizer = Sanitizer::from_config(&SanitizerConfig::default(), signature()).unwrap();
        let html = "<html><head></head><body><main><section><h2>A</h2><iframe></iframe><p>B</p></section><aside>C</aside></main></body></html>";
        let out = sanitizer.sanitize(html);
        assert_eq!(
            out.html,
            "<html><head></head><body><main><section><h2>A</h2><p>B</p></section><aside>C</aside></main></body></html>"
        );
    }

    #[test]
    fn legacy_doctype_survives_sanitizing() {
        let sanitizer = Sanitizer::from_config(&SanitizerConfig::default(), signature()).unwrap();
        let html = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\">\n<html><body><p>x</p></body></html>";
        let out = sanitizer.sanitize(html);
        assert!(out.html.starts_with(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01 Transitional//EN\">"
        ));
    }

    #[test]
    fn inline_svg_is_idempotent() {
        let html = concat!(
            "<html><head></head><body>",
            r#"<svg xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            r#"<style>text::after{content:"a&lt;b"}</style>"#,
            r##"<use xlink:href="#icon"></use></svg>"##,
            "</body></html>",
        );
        for config in [SanitizerConfig::default(), SanitizerConfig::default().preserve_formatting(false)] {
            let sanitizer = Sanitizer::from_config(&config, signature()).unwrap();
            let once = sanitizer.sanitize(html).html;
            let twice = sanitizer.sanitize(&once).html;
            assert_eq!(once, twice);
            assert!(once.contains("a&lt;b"));
            assert!(once.contains(r##"xlink:href="#icon""##));
        }
    }
}
