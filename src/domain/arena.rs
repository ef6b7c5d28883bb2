use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::entities::OrgNode;

/// Data payload for a displayed org chart node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// Display label
    pub label: String,
    /// Number of nodes below this one
    pub subtree_size: usize,
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Tree node in the arena; its arena index is the node's synthetic identifier.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

/// Sibling order for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Order produced by the pipeline
    #[default]
    Insertion,
    /// Case-insensitive by label
    Name,
    /// Largest subtree first, ties by name
    Size,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "insertion" => Ok(Self::Insertion),
            "name" => Ok(Self::Name),
            "size" => Ok(Self::Size),
            other => Err(format!(
                "unknown sort order '{}' (expected insertion, name or size)",
                other
            )),
        }
    }
}

/// Read-only arena view of a cleaned org chart for rendering.
///
/// The root is a synthetic node carrying the chart's title; every label of
/// the chart becomes one arena node with a stable index.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl TreeArena {
    fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Build the view from a chart under a synthetic root labelled `root_label`.
    #[instrument(level = "debug", skip(chart))]
    pub fn from_org_node(root_label: &str, chart: &OrgNode) -> Self {
        let mut tree = Self::new();
        let root = tree.insert_node(
            NodeData {
                label: root_label.to_string(),
                subtree_size: chart.node_count(),
            },
            None,
        );
        tree.insert_children(root, chart);
        tree
    }

    fn insert_children(&mut self, parent: Index, node: &OrgNode) {
        for (label, child) in node.iter() {
            let idx = self.insert_node(
                NodeData {
                    label: label.to_string(),
                    subtree_size: child.node_count(),
                },
                Some(parent),
            );
            self.insert_children(idx, child);
        }
    }

    #[instrument(level = "trace", skip(self))]
    fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn subtree_size(&self, idx: Index) -> usize {
        self.get_node(idx).map_or(0, |node| node.data.subtree_size)
    }

    /// Children of `idx` in the requested display order.
    pub fn children_sorted(&self, idx: Index, order: SortOrder) -> Vec<Index> {
        let Some(node) = self.get_node(idx) else {
            return Vec::new();
        };
        let mut children = node.children.clone();
        match order {
            SortOrder::Insertion => {}
            SortOrder::Name => children.sort_by(|&a, &b| self.compare_names(a, b)),
            SortOrder::Size => children.sort_by(|&a, &b| {
                self.subtree_size(b)
                    .cmp(&self.subtree_size(a))
                    .then_with(|| self.compare_names(a, b))
            }),
        }
        children
    }

    fn compare_names(&self, a: Index, b: Index) -> Ordering {
        let label = |idx| {
            self.get_node(idx)
                .map(|n| n.data.label.to_lowercase())
                .unwrap_or_default()
        };
        label(a).cmp(&label(b))
    }

    /// Nodes whose label contains `query`, case-insensitive, depth-first.
    ///
    /// The synthetic root never matches; an empty query matches nothing.
    #[instrument(level = "debug", skip(self))]
    pub fn search(&self, query: &str) -> Vec<Index> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }
        self.iter()
            .filter(|(idx, node)| {
                Some(*idx) != self.root && node.data.label.to_lowercase().contains(&query)
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    /// The given nodes plus all of their ancestors.
    pub fn visible_with_ancestors(&self, matches: &[Index]) -> HashSet<Index> {
        let mut visible = HashSet::new();
        for &idx in matches {
            let mut current = Some(idx);
            while let Some(i) = current {
                if !visible.insert(i) {
                    break;
                }
                current = self.get_node(i).and_then(|n| n.parent);
            }
        }
        visible
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }
}

/// Pre-order, left-to-right traversal.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena(json: &str) -> TreeArena {
        TreeArena::from_org_node("Org", &OrgNode::from_json_str(json).unwrap())
    }

    fn labels(tree: &TreeArena, indices: &[Index]) -> Vec<String> {
        indices
            .iter()
            .map(|&i| tree.get_node(i).unwrap().data.label.clone())
            .collect()
    }

    #[test]
    fn given_chart_when_building_arena_then_one_node_per_label_plus_root() {
        let tree = arena(r#"{"A": {"B": {}, "C": {}}, "D": {}}"#);

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.subtree_size(tree.root().unwrap()), 4);
        let labels: Vec<_> = tree.iter().map(|(_, n)| n.data.label.as_str()).collect();
        assert_eq!(labels, vec!["Org", "A", "B", "C", "D"]);
    }

    #[test]
    fn given_size_order_when_sorting_children_then_largest_first() {
        let tree = arena(r#"{"small": {}, "Big": {"x": {}, "y": {}}, "alpha": {}}"#);
        let root = tree.root().unwrap();

        let by_size = tree.children_sorted(root, SortOrder::Size);
        let by_name = tree.children_sorted(root, SortOrder::Name);
        let as_is = tree.children_sorted(root, SortOrder::Insertion);

        assert_eq!(labels(&tree, &by_size), vec!["Big", "alpha", "small"]);
        assert_eq!(labels(&tree, &by_name), vec!["alpha", "Big", "small"]);
        assert_eq!(labels(&tree, &as_is), vec!["small", "Big", "alpha"]);
    }

    #[test]
    fn given_query_when_searching_then_matches_case_insensitive_with_ancestors() {
        let tree = arena(r#"{"Research": {"Vision": {"Data": {}}}, "Data Platform": {}}"#);

        let matches = tree.search("data");
        assert_eq!(labels(&tree, &matches), vec!["Data", "Data Platform"]);

        let visible = tree.visible_with_ancestors(&matches);
        // both matches, Vision, Research and the root
        assert_eq!(visible.len(), 5);
    }

    #[test]
    fn given_sort_names_when_parsing_then_case_insensitive() {
        assert_eq!("Size".parse::<SortOrder>(), Ok(SortOrder::Size));
        assert_eq!(" name ".parse::<SortOrder>(), Ok(SortOrder::Name));
        assert!("random".parse::<SortOrder>().is_err());
    }

    #[test]
    fn given_empty_query_when_searching_then_no_matches() {
        let tree = arena(r#"{"Research": {}}"#);
        assert!(tree.search("  ").is_empty());
    }
}
