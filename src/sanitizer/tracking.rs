//! Vendor attribute and class stripping.

use std::sync::Arc;

use super::Pass;
use crate::config::TrackingSignature;
use crate::document::Document;
use crate::stats::RunStatistics;

/// Removes the signature's attributes from every element, whatever its tag.
pub struct TrackingAttributes {
    signature: Arc<TrackingSignature>,
}

impl TrackingAttributes {
    pub fn new(signature: Arc<TrackingSignature>) -> Self {
        Self { signature }
    }
}

impl Pass for TrackingAttributes {
    fn name(&self) -> &'static str {
        "tracking-attributes"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        for id in doc.elements() {
            for name in &self.signature.attributes {
                if doc.remove_attr(id, name) {
                    stats.attributes += 1;
                }
            }
        }
    }
}

/// Removes the signature's class tokens. An element left without classes
/// loses its `class` attribute entirely.
pub struct TrackingClasses {
    signature: Arc<TrackingSignature>,
}

impl TrackingClasses {
    pub fn new(signature: Arc<TrackingSignature>) -> Self {
        Self { signature }
    }
}

impl Pass for TrackingClasses {
    fn name(&self) -> &'static str {
        "tracking-classes"
    }

    fn apply(&self, doc: &mut Document, stats: &mut RunStatistics) {
        for id in doc.elements() {
            let Some(class) = doc.attr(id, "class") else {
                continue;
            };
            let (kept, dropped) = {
                let mut dropped = 0;
                let kept: Vec<&str> = class
                    .split_ascii_whitespace()
                    .filter(|token| {
                        let tracking = self.signature.is_tracking_class(token);
                        dropped += usize::from(tracking);
                        !tracking
                    })
                    .collect();
                (kept.join(" "), dropped)
            };
            if dropped == 0 {
                continue;
            }

            if kept.is_empty() {
                doc.remove_attr(id, "class");
            } else {
                doc.set_attr(id, "class", kept);
            }
            stats.classes += dropped;
        }
    }
}
