//! Prefix grouper: discovers latent hierarchy among sibling labels.
//!
//! Siblings sharing a meaningful textual prefix ("AIML Data Platform",
//! "AIML Search Infrastructure", ...) are re-parented under a synthesized
//! node named after the prefix, recursively.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, instrument};

use crate::domain::entities::OrgNode;

pub const DEFAULT_MIN_GROUP_SIZE: usize = 3;
pub const DEFAULT_MIN_PREFIX_LEN: usize = 3;

/// A member label shorter than this after prefix removal keeps its full label.
const MIN_REMAINDER_LEN: usize = 2;

lazy_static! {
    static ref ACRONYM_PREFIX: Regex = Regex::new(r"^[A-Z0-9/]+$").unwrap();
}

fn is_boundary(c: char) -> bool {
    matches!(c, ' ' | '/' | '-')
}

/// Longest common prefix of two labels that ends on a word boundary.
///
/// Returns an empty string when the pair carries no grouping signal.
pub fn pair_prefix(a: &str, b: &str) -> String {
    let (first, last) = if a <= b { (a, b) } else { (b, a) };
    let first: Vec<char> = first.chars().collect();
    let last: Vec<char> = last.chars().collect();

    let mismatch = first
        .iter()
        .zip(&last)
        .take_while(|(x, y)| x == y)
        .count();
    let raw: String = first[..mismatch].iter().collect();
    let candidate = raw.trim();
    let len = candidate.chars().count();
    if len < 2 {
        return String::new();
    }

    let end = raw.chars().take_while(|c| c.is_whitespace()).count() + len;
    let followed_by_space = first.get(end) == Some(&' ') || last.get(end) == Some(&' ');
    let ends_on_separator = candidate.chars().last().is_some_and(is_boundary);

    if followed_by_space || ends_on_separator || ACRONYM_PREFIX.is_match(candidate) {
        return candidate.to_string();
    }

    // Fall back to the last word boundary inside the candidate.
    match candidate.rfind(is_boundary) {
        Some(pos) => {
            let truncated = candidate[..pos].trim();
            if truncated.chars().count() >= 2 {
                truncated.to_string()
            } else {
                String::new()
            }
        }
        None => String::new(),
    }
}

/// Common boundary prefix of a whole label set.
///
/// The common prefix of a set is the common prefix of its lexicographically
/// smallest and largest members.
pub fn common_prefix(labels: &[&str]) -> String {
    if labels.len() < 2 {
        return String::new();
    }
    match (labels.iter().min(), labels.iter().max()) {
        (Some(min), Some(max)) => pair_prefix(min, max),
        _ => String::new(),
    }
}

/// Group siblings with the default prefix length.
pub fn group(siblings: &OrgNode, min_group_size: usize) -> OrgNode {
    PrefixGrouper::new(min_group_size, DEFAULT_MIN_PREFIX_LEN).group(siblings)
}

/// A registered prefix group: its label and member indices in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGroup {
    pub prefix: String,
    pub members: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixGrouper {
    min_group_size: usize,
    min_prefix_len: usize,
}

impl Default for PrefixGrouper {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_GROUP_SIZE, DEFAULT_MIN_PREFIX_LEN)
    }
}

impl PrefixGrouper {
    pub fn new(min_group_size: usize, min_prefix_len: usize) -> Self {
        Self {
            min_group_size,
            min_prefix_len,
        }
    }

    pub fn min_group_size(&self) -> usize {
        self.min_group_size
    }

    pub fn min_prefix_len(&self) -> usize {
        self.min_prefix_len
    }

    /// Find prefix groups among `labels`, greedily in insertion order.
    pub fn find_groups(&self, labels: &[&str]) -> Vec<PrefixGroup> {
        let mut assigned = vec![false; labels.len()];
        let mut groups: Vec<PrefixGroup> = Vec::new();

        for seed in 0..labels.len() {
            if assigned[seed] {
                continue;
            }
            let mut candidates = vec![seed];
            for other in 0..labels.len() {
                if other == seed || assigned[other] {
                    continue;
                }
                let shared = pair_prefix(labels[seed], labels[other]);
                if shared.chars().count() >= self.min_prefix_len {
                    candidates.push(other);
                }
            }
            if candidates.len() < self.min_group_size {
                continue;
            }

            let members: Vec<&str> = candidates.iter().map(|&i| labels[i]).collect();
            let prefix = common_prefix(&members);
            if prefix.is_empty() || groups.iter().any(|g| g.prefix == prefix) {
                continue;
            }

            for &i in &candidates {
                assigned[i] = true;
            }
            candidates.sort_unstable();
            groups.push(PrefixGroup {
                prefix,
                members: candidates,
            });
        }
        groups
    }

    /// Re-parent prefix groups under synthesized nodes, recursively.
    ///
    /// A group is emitted where its earliest member stood; ungrouped labels
    /// keep their position and have their own children grouped.
    #[instrument(level = "trace", skip_all, fields(siblings = siblings.len()))]
    pub fn group(&self, siblings: &OrgNode) -> OrgNode {
        if siblings.len() < self.min_group_size {
            return siblings.clone();
        }

        let entries: Vec<(&str, &OrgNode)> = siblings.iter().collect();
        let labels: Vec<&str> = entries.iter().map(|(label, _)| *label).collect();
        let groups = self.find_groups(&labels);

        let mut group_of: Vec<Option<usize>> = vec![None; entries.len()];
        for (g, group) in groups.iter().enumerate() {
            for &i in &group.members {
                group_of[i] = Some(g);
            }
        }

        let mut emitted = vec![false; groups.len()];
        let mut result = OrgNode::new();
        for (i, (label, child)) in entries.iter().enumerate() {
            match group_of[i] {
                Some(g) if !emitted[g] => {
                    emitted[g] = true;
                    let group = &groups[g];
                    debug!(
                        "group: {:?} <- {:?}",
                        group.prefix,
                        group.members.iter().map(|&m| labels[m]).collect::<Vec<_>>()
                    );
                    result.merge_child(group.prefix.clone(), self.build_group(group, &entries));
                }
                Some(_) => {}
                None => result.merge_child(*label, self.group(child)),
            }
        }
        result
    }

    fn build_group(&self, group: &PrefixGroup, entries: &[(&str, &OrgNode)]) -> OrgNode {
        let mut children = OrgNode::new();
        let mut shortened = false;
        for &m in &group.members {
            let (label, child) = entries[m];
            let child_label = member_label(label, &group.prefix);
            shortened |= child_label != label;
            children.merge_child(child_label, child.clone());
        }

        if shortened {
            self.group(&children)
        } else {
            // Same labels as the members: regrouping would find this group again.
            children
                .into_iter()
                .map(|(label, child)| (label, self.group(&child)))
                .collect()
        }
    }
}

/// Member label with the group prefix removed, or the full label if too little remains.
fn member_label(label: &str, prefix: &str) -> String {
    let remainder = label.strip_prefix(prefix).unwrap_or(label).trim();
    if remainder.chars().count() < MIN_REMAINDER_LEN {
        label.to_string()
    } else {
        remainder.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> OrgNode {
        OrgNode::from_json_str(json).unwrap()
    }

    #[test]
    fn given_word_boundary_when_extracting_pair_prefix_then_returns_trimmed_prefix() {
        assert_eq!(pair_prefix("AIML Infrastructure", "AIML Data Platform"), "AIML");
        assert_eq!(pair_prefix("Data", "Data Platform"), "Data");
    }

    #[test]
    fn given_mismatch_inside_word_when_extracting_then_falls_back_to_last_boundary() {
        assert_eq!(pair_prefix("Data Platform", "Data Pipeline"), "Data");
    }

    #[test]
    fn given_separator_ending_prefix_when_extracting_then_keeps_it() {
        assert_eq!(pair_prefix("Front-End Web", "Front-Office"), "Front-");
    }

    #[test]
    fn given_acronym_prefix_when_extracting_then_accepts_without_boundary() {
        assert_eq!(pair_prefix("GPUDriver", "GPUKernel"), "GPU");
    }

    #[test]
    fn given_no_boundary_when_extracting_then_empty() {
        assert_eq!(pair_prefix("Marketing", "Markets"), "");
        assert_eq!(pair_prefix("A X", "A Y"), "");
        assert_eq!(pair_prefix("Sales", "Design"), "");
    }

    #[test]
    fn given_label_set_when_computing_common_prefix_then_uses_extremes() {
        let labels = ["Cloud Infra", "Cloud Billing", "Cloud Security"];
        assert_eq!(common_prefix(&labels), "Cloud");
        assert_eq!(common_prefix(&["Cloud"]), "");
    }

    #[test]
    fn given_four_siblings_with_shared_prefix_when_grouping_then_synthesizes_parent() {
        let siblings = chart(
            r#"{
                "AIML Infrastructure Teams": {},
                "AIML Data Platform": {},
                "AIML Engineering Efficiency": {},
                "AIML Search Infrastructure": {},
                "Design System": {}
            }"#,
        );

        let result = group(&siblings, 3);

        assert_eq!(
            result.labels().collect::<Vec<_>>(),
            vec!["AIML", "Design System"]
        );
        assert_eq!(
            result.get("AIML").unwrap().labels().collect::<Vec<_>>(),
            vec![
                "Infrastructure Teams",
                "Data Platform",
                "Engineering Efficiency",
                "Search Infrastructure"
            ]
        );
    }

    #[test]
    fn given_two_siblings_sharing_prefix_when_grouping_then_unchanged() {
        let siblings = chart(r#"{"Data Platform": {}, "Data Science": {}, "Marketing": {}}"#);

        let result = group(&siblings, 3);

        assert_eq!(result, siblings);
    }

    #[test]
    fn given_fewer_siblings_than_threshold_when_grouping_then_returns_input() {
        let siblings = chart(r#"{"Data Platform": {}, "Data Science": {}}"#);
        assert_eq!(group(&siblings, 3), siblings);
    }

    #[test]
    fn given_nested_shared_prefixes_when_grouping_then_creates_sub_groups() {
        let siblings = chart(
            r#"{
                "Cloud Infra Compute": {},
                "Cloud Infra Storage": {},
                "Cloud Infra Network": {},
                "Cloud Security": {},
                "Cloud Billing": {}
            }"#,
        );

        let result = group(&siblings, 3);

        let cloud = result.get("Cloud").unwrap();
        assert_eq!(
            cloud.labels().collect::<Vec<_>>(),
            vec!["Infra", "Security", "Billing"]
        );
        assert_eq!(
            cloud.get("Infra").unwrap().labels().collect::<Vec<_>>(),
            vec!["Compute", "Storage", "Network"]
        );
    }

    #[test]
    fn given_short_remainders_when_grouping_then_keeps_full_labels_and_terminates() {
        let siblings = chart(r#"{"ABC X": {}, "ABC Y": {}, "ABC Z": {}}"#);

        let result = group(&siblings, 3);

        let abc = result.get("ABC").unwrap();
        assert_eq!(
            abc.labels().collect::<Vec<_>>(),
            vec!["ABC X", "ABC Y", "ABC Z"]
        );
    }

    #[test]
    fn given_ungrouped_sibling_when_grouping_then_recurses_into_its_children() {
        let siblings = chart(
            r#"{
                "Research": {
                    "Vision Models": {},
                    "Vision Data": {},
                    "Vision Eval": {}
                },
                "Sales": {},
                "Support": {}
            }"#,
        );

        let result = group(&siblings, 3);

        let research = result.get("Research").unwrap();
        assert_eq!(research.labels().collect::<Vec<_>>(), vec!["Vision"]);
        assert_eq!(research.get("Vision").unwrap().len(), 3);
    }

    #[test]
    fn given_children_of_members_when_grouping_then_children_travel_with_member() {
        let siblings = chart(
            r#"{
                "Data Platform": {"Ingest": {}},
                "Data Science": {},
                "Data Engineering": {}
            }"#,
        );

        let result = group(&siblings, 3);

        let platform = result.get("Data").unwrap().get("Platform").unwrap();
        assert!(platform.contains("Ingest"));
    }
}
