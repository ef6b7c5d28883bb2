//! Domain entities: core data structures

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::domain::error::DomainError;

/// A node of an org chart: an insertion-ordered mapping from label to children.
///
/// Labels are the only payload. Sibling labels are pairwise distinct and the
/// order in which they were inserted is the iteration order every greedy pass
/// relies on. A leaf is an empty mapping, never an absent node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgNode {
    children: Vec<(String, OrgNode)>,
}

impl OrgNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document whose root is a nested label mapping.
    pub fn from_json_str(content: &str) -> Result<Self, DomainError> {
        // Parse straight into OrgNode: going through Value would lose key order.
        serde_json::from_str(content).map_err(|e| {
            match serde_json::from_str::<serde_json::Value>(content) {
                Ok(value) if !value.is_object() => DomainError::RootNotMapping {
                    found: json_kind(&value).to_string(),
                },
                _ => DomainError::MalformedInput {
                    message: e.to_string(),
                },
            }
        })
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OrgNode)> {
        self.children.iter().map(|(label, child)| (label.as_str(), child))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(label, _)| label.as_str())
    }

    pub fn get(&self, label: &str) -> Option<&OrgNode> {
        self.children
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, child)| child)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Insert a child, replacing the subtree of an existing label in place.
    ///
    /// Last write wins; the label keeps the position of its first insertion.
    pub fn insert(&mut self, label: impl Into<String>, child: OrgNode) {
        let label = label.into();
        match self.children.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = child,
            None => self.children.push((label, child)),
        }
    }

    /// Insert a child, unioning its children into an existing label's children.
    ///
    /// Grandchild keys that collide are resolved last-write-wins, dropping the
    /// earlier grandchild subtree.
    pub fn merge_child(&mut self, label: impl Into<String>, child: OrgNode) {
        let label = label.into();
        match self.children.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1.merge_children_from(child),
            None => self.children.push((label, child)),
        }
    }

    /// Key-union of `other`'s children into this node (last write wins).
    pub fn merge_children_from(&mut self, other: OrgNode) {
        for (label, child) in other.children {
            self.insert(label, child);
        }
    }

    /// Number of nodes below this one.
    pub fn node_count(&self) -> usize {
        self.children
            .iter()
            .map(|(_, child)| 1 + child.node_count())
            .sum()
    }

    /// Number of levels below this one; a leaf has depth 0.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|(_, child)| 1 + child.depth())
            .max()
            .unwrap_or(0)
    }

    /// Structural equality that ignores sibling order.
    pub fn equivalent(&self, other: &OrgNode) -> bool {
        self.len() == other.len()
            && self.iter().all(|(label, child)| {
                other
                    .get(label)
                    .is_some_and(|other_child| child.equivalent(other_child))
            })
    }
}

impl<S: Into<String>> FromIterator<(S, OrgNode)> for OrgNode {
    fn from_iter<I: IntoIterator<Item = (S, OrgNode)>>(iter: I) -> Self {
        let mut node = OrgNode::new();
        for (label, child) in iter {
            node.insert(label, child);
        }
        node
    }
}

impl IntoIterator for OrgNode {
    type Item = (String, OrgNode);
    type IntoIter = std::vec::IntoIter<(String, OrgNode)>;

    fn into_iter(self) -> Self::IntoIter {
        self.children.into_iter()
    }
}

impl Serialize for OrgNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.children.len()))?;
        for (label, child) in &self.children {
            map.serialize_entry(label, child)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for OrgNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OrgNodeVisitor)
    }
}

struct OrgNodeVisitor;

impl<'de> Visitor<'de> for OrgNodeVisitor {
    type Value = OrgNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping from label to child mapping")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut node = OrgNode::new();
        while let Some((label, child)) = map.next_entry::<String, OrgNode>()? {
            node.insert(label, child);
        }
        Ok(node)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> OrgNode {
        OrgNode::new()
    }

    #[test]
    fn given_duplicate_insert_when_inserting_then_keeps_first_position_and_last_value() {
        let mut node = OrgNode::new();
        node.insert("A", leaf());
        node.insert("B", leaf());
        node.insert("A", [("x", leaf())].into_iter().collect());

        let labels: Vec<_> = node.labels().collect();
        assert_eq!(labels, vec!["A", "B"]);
        assert!(node.get("A").unwrap().contains("x"));
    }

    #[test]
    fn given_existing_label_when_merging_child_then_unions_grandchildren() {
        let mut node = OrgNode::new();
        node.insert("A", [("x", leaf())].into_iter().collect());
        node.merge_child("A", [("y", leaf())].into_iter().collect());

        let a = node.get("A").unwrap();
        assert_eq!(a.labels().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn given_colliding_grandchild_when_merging_then_last_write_wins() {
        let mut node = OrgNode::new();
        node.insert(
            "A",
            [("x", [("old", leaf())].into_iter().collect())]
                .into_iter()
                .collect(),
        );
        node.merge_child(
            "A",
            [("x", [("new", leaf())].into_iter().collect())]
                .into_iter()
                .collect(),
        );

        let x = node.get("A").unwrap().get("x").unwrap();
        assert!(x.contains("new"));
        assert!(!x.contains("old"));
    }

    #[test]
    fn given_json_when_parsing_then_preserves_document_order() {
        let node = OrgNode::from_json_str(r#"{"Zeta": {}, "Alpha": {"Beta": {}}, "Mu": {}}"#)
            .unwrap();

        assert_eq!(node.labels().collect::<Vec<_>>(), vec!["Zeta", "Alpha", "Mu"]);
        assert_eq!(node.node_count(), 4);
        assert_eq!(node.depth(), 2);
    }

    #[test]
    fn given_non_object_root_when_parsing_then_errors() {
        let result = OrgNode::from_json_str("[1, 2]");
        assert!(matches!(result, Err(DomainError::RootNotMapping { .. })));
    }

    #[test]
    fn given_non_object_child_when_parsing_then_errors() {
        let result = OrgNode::from_json_str(r#"{"A": "leaf"}"#);
        assert!(matches!(result, Err(DomainError::MalformedInput { .. })));
    }

    #[test]
    fn given_node_when_serializing_then_round_trips_order() {
        let node = OrgNode::from_json_str(r#"{"B": {"C": {}}, "A": {}}"#).unwrap();
        let json = serde_json::to_string(&node).unwrap();
        assert_eq!(json, r#"{"B":{"C":{}},"A":{}}"#);
    }

    #[test]
    fn given_reordered_siblings_when_comparing_then_equivalent_but_not_equal() {
        let a = OrgNode::from_json_str(r#"{"A": {"x": {}, "y": {}}, "B": {}}"#).unwrap();
        let b = OrgNode::from_json_str(r#"{"B": {}, "A": {"y": {}, "x": {}}}"#).unwrap();

        assert!(a.equivalent(&b));
        assert_ne!(a, b);
    }
}
