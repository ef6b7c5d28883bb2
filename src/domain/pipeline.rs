//! Orchestration: clean, dedupe and group an org chart, depth-first.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::domain::cleaner::clean;
use crate::domain::entities::OrgNode;
use crate::domain::grouping::{PrefixGrouper, DEFAULT_MIN_GROUP_SIZE, DEFAULT_MIN_PREFIX_LEN};
use crate::domain::similarity::{SimilarityMerger, DEFAULT_MIN_LENGTH_RATIO};

/// Tunables of the transform. Defaults reproduce the reference behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Minimum number of siblings that form a prefix group
    pub min_group_size: usize,
    /// Minimum shared prefix length for a sibling to join a seed's group
    pub min_prefix_len: usize,
    /// Minimum `shorter/longer` ratio for containment similarity
    pub min_length_ratio: f64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
            min_prefix_len: DEFAULT_MIN_PREFIX_LEN,
            min_length_ratio: DEFAULT_MIN_LENGTH_RATIO,
        }
    }
}

/// Clean, dedupe and group with default options.
pub fn process(node: &OrgNode) -> OrgNode {
    Pipeline::default().process(node)
}

/// The full tree transform: label cleaner, similarity merger, prefix grouper.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pipeline {
    merger: SimilarityMerger,
    grouper: PrefixGrouper,
}

impl From<PipelineOptions> for Pipeline {
    fn from(options: PipelineOptions) -> Self {
        Self::new(
            SimilarityMerger::new(options.min_length_ratio),
            PrefixGrouper::new(options.min_group_size, options.min_prefix_len),
        )
    }
}

impl Pipeline {
    pub fn new(merger: SimilarityMerger, grouper: PrefixGrouper) -> Self {
        Self { merger, grouper }
    }

    /// Produce a cleaned copy of `node`; the input is never modified.
    ///
    /// A rejected label drops its whole subtree. Two raw labels cleaning to the
    /// same label have their children merged by key-union. An empty result is
    /// a valid "no children" answer.
    #[instrument(level = "trace", skip_all, fields(siblings = node.len()))]
    pub fn process(&self, node: &OrgNode) -> OrgNode {
        let mut cleaned = OrgNode::new();
        for (raw_label, raw_child) in node.iter() {
            match clean(raw_label) {
                Some(label) => {
                    if cleaned.contains(&label) {
                        trace!("process: {:?} merges into {:?}", raw_label, label);
                    }
                    cleaned.merge_child(label, self.process(raw_child));
                }
                None => debug!(
                    "process: dropped {:?} with {} descendants",
                    raw_label,
                    raw_child.node_count()
                ),
            }
        }

        let deduped = self.merger.dedupe(&cleaned);
        self.grouper.group(&deduped)
    }
}

/// Raw labels the cleaner rejects, top-down.
///
/// Rejected subtrees are not descended into: their descendants vanish with
/// them and are not reported separately.
pub fn rejected_labels(node: &OrgNode) -> Vec<String> {
    let mut rejected = Vec::new();
    collect_rejected(node, &mut rejected);
    rejected
}

fn collect_rejected(node: &OrgNode, rejected: &mut Vec<String>) {
    for (label, child) in node.iter() {
        if clean(label).is_some() {
            collect_rejected(child, rejected);
        } else {
            rejected.push(label.to_string());
        }
    }
}
