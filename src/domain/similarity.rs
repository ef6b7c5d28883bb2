//! Similarity merger: collapses sibling labels that name the same entity.
//!
//! Two labels are similar when their alphanumeric skeletons are equal, or one
//! skeleton contains the other and they are close in length. Classes are
//! built greedily in insertion order, so the partition is deterministic but
//! not a transitive closure: with A~B, B~C and not A~C, C may end up alone.

use tracing::{debug, instrument};

use crate::domain::entities::OrgNode;

/// Minimum `shorter/longer` length ratio for a containment match.
pub const DEFAULT_MIN_LENGTH_RATIO: f64 = 0.7;

/// Lowercase and keep only ASCII letters and digits.
pub fn normalize_for_comparison(label: &str) -> String {
    label
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect()
}

/// Similarity with the default length ratio.
pub fn are_similar(a: &str, b: &str) -> bool {
    SimilarityMerger::default().are_similar(a, b)
}

/// Pick the representative of a class: longest label, ties by lexicographic order.
///
/// The result does not depend on the order of `candidates`.
pub fn choose_canonical<'a>(candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .min_by(|a, b| {
            b.chars()
                .count()
                .cmp(&a.chars().count())
                .then_with(|| a.cmp(b))
        })
}

/// Merge similar siblings at every level, using the default ratio.
pub fn dedupe(siblings: &OrgNode) -> OrgNode {
    SimilarityMerger::default().dedupe(siblings)
}

/// Stateless merger carrying its length-ratio threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityMerger {
    min_length_ratio: f64,
}

impl Default for SimilarityMerger {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_LENGTH_RATIO)
    }
}

impl SimilarityMerger {
    pub fn new(min_length_ratio: f64) -> Self {
        Self { min_length_ratio }
    }

    pub fn min_length_ratio(&self) -> f64 {
        self.min_length_ratio
    }

    pub fn are_similar(&self, a: &str, b: &str) -> bool {
        self.are_similar_normalized(&normalize_for_comparison(a), &normalize_for_comparison(b))
    }

    fn are_similar_normalized(&self, norm_a: &str, norm_b: &str) -> bool {
        if norm_a == norm_b {
            return true;
        }
        let (shorter, longer) = if norm_a.len() <= norm_b.len() {
            (norm_a, norm_b)
        } else {
            (norm_b, norm_a)
        };
        longer.contains(shorter)
            && (shorter.len() as f64 / longer.len() as f64) >= self.min_length_ratio
    }

    /// Greedy partition of `labels` into similarity classes.
    ///
    /// Each class lists indices into `labels`; the first index is the seed and
    /// classes appear in seed order.
    pub fn partition(&self, labels: &[&str]) -> Vec<Vec<usize>> {
        let normalized: Vec<String> = labels
            .iter()
            .map(|l| normalize_for_comparison(l))
            .collect();
        let mut assigned = vec![false; labels.len()];
        let mut classes = Vec::new();

        for seed in 0..labels.len() {
            if assigned[seed] {
                continue;
            }
            assigned[seed] = true;
            let mut class = vec![seed];
            for other in (seed + 1)..labels.len() {
                if !assigned[other]
                    && self.are_similar_normalized(&normalized[seed], &normalized[other])
                {
                    assigned[other] = true;
                    class.push(other);
                }
            }
            classes.push(class);
        }
        classes
    }

    /// Collapse each similarity class to its canonical label, unioning children,
    /// then recurse into the merged children.
    #[instrument(level = "trace", skip_all, fields(siblings = siblings.len()))]
    pub fn dedupe(&self, siblings: &OrgNode) -> OrgNode {
        let entries: Vec<(&str, &OrgNode)> = siblings.iter().collect();
        let labels: Vec<&str> = entries.iter().map(|(label, _)| *label).collect();

        let mut result = OrgNode::new();
        for class in self.partition(&labels) {
            let members: Vec<&str> = class.iter().map(|&i| labels[i]).collect();
            let canonical = choose_canonical(&members).unwrap_or(members[0]);
            if members.len() > 1 {
                debug!("dedupe: {:?} -> {:?}", members, canonical);
            }

            let mut merged = OrgNode::new();
            for &i in &class {
                merged.merge_children_from(entries[i].1.clone());
            }
            result.merge_child(canonical, self.dedupe(&merged));
        }
        result
    }
}
