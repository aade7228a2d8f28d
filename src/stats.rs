//! Per-file counters. Purely observational: no pass reads them back.

use std::ops::AddAssign;

/// What the passes changed in one document (or, summed, in a whole batch).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStatistics {
    pub comments: usize,
    pub iframes: usize,
    pub canonical_links: usize,
    pub meta_tags: usize,
    pub attributes: usize,
    pub classes: usize,
    pub styles_merged: usize,
    pub links_examined: usize,
    pub links_rewritten: usize,
}

impl RunStatistics {
    /// Total number of edits, excluding the `links_examined` tally.
    pub fn changes(&self) -> usize {
        self.comments
            + self.iframes
            + self.canonical_links
            + self.meta_tags
            + self.attributes
            + self.classes
            + self.styles_merged
            + self.links_rewritten
    }
}

impl AddAssign for RunStatistics {
    fn add_assign(&mut self, rhs: Self) {
        self.comments += rhs.comments;
        self.iframes += rhs.iframes;
        self.canonical_links += rhs.canonical_links;
        self.meta_tags += rhs.meta_tags;
        self.attributes += rhs.attributes;
        self.classes += rhs.classes;
        self.styles_merged += rhs.styles_merged;
        self.links_examined += rhs.links_examined;
        self.links_rewritten += rhs.links_rewritten;
    }
}

/// Size reduction in percent. Zero-byte input reports 0.
pub fn reduction_percent(original: u64, cleaned: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - cleaned as f64) / original as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduction_of_empty_input_is_zero() {
        assert_eq!(reduction_percent(0, 0), 0.0);
        assert_eq!(reduction_percent(0, 120), 0.0);
    }

    #[test]
    fn reduction_is_percentage_of_original() {
        assert_eq!(reduction_percent(200, 150), 25.0);
        assert!(reduction_percent(100, 110) < 0.0);
    }

    #[test]
    fn add_assign_sums_every_field() {
        let mut total = RunStatistics {
            iframes: 2,
            links_examined: 4,
            ..Default::default()
        };
        total += RunStatistics {
            iframes: 1,
            comments: 3,
            links_rewritten: 1,
            ..Default::default()
        };
        assert_eq!(total.iframes, 3);
        assert_eq!(total.comments, 3);
        assert_eq!(total.changes(), 7);
        assert_eq!(total.links_examined, 4);
    }
}
