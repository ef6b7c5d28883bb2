//! Tree view of a cleaned org chart
//!
//! Builds a `termtree::Tree` from the arena view, honoring sort order and an
//! optional label search (matches are shown together with their ancestors).

use std::collections::HashSet;

use colored::Colorize;
use generational_arena::Index;
use regex::{Regex, RegexBuilder};
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::{OrgNode, SortOrder, TreeArena};

/// How to render a chart.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub sort: SortOrder,
    /// Case-insensitive substring filter
    pub search: Option<String>,
    /// Label of the synthetic root
    pub root_label: String,
    /// Colorize search matches
    pub highlight: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sort: SortOrder::Insertion,
            search: None,
            root_label: "Organization".into(),
            highlight: false,
        }
    }
}

/// Render `chart` as a tree; None when there is nothing to show.
///
/// A chart without labels, or a search without matches, renders nothing.
#[instrument(level = "debug", skip_all, fields(sort = ?options.sort, search = ?options.search))]
pub fn render_tree(chart: &OrgNode, options: &RenderOptions) -> Option<Tree<String>> {
    if chart.is_empty() {
        return None;
    }
    let arena = TreeArena::from_org_node(&options.root_label, chart);
    let root = arena.root()?;

    let query = options
        .search
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let renderer = match query {
        Some(query) => {
            let matches = arena.search(query);
            debug!("render_tree: {} matches for {:?}", matches.len(), query);
            if matches.is_empty() {
                return None;
            }
            Renderer {
                arena: &arena,
                sort: options.sort,
                visible: Some(arena.visible_with_ancestors(&matches)),
                matched: matches.into_iter().collect(),
                pattern: options.highlight.then(|| match_pattern(query)).flatten(),
            }
        }
        None => Renderer {
            arena: &arena,
            sort: options.sort,
            visible: None,
            matched: HashSet::new(),
            pattern: None,
        },
    };

    Some(renderer.build(root))
}

fn match_pattern(query: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .ok()
}

struct Renderer<'a> {
    arena: &'a TreeArena,
    sort: SortOrder,
    /// None shows every node
    visible: Option<HashSet<Index>>,
    matched: HashSet<Index>,
    pattern: Option<Regex>,
}

impl Renderer<'_> {
    fn build(&self, idx: Index) -> Tree<String> {
        let label = self
            .arena
            .get_node(idx)
            .map(|node| node.data.label.as_str())
            .unwrap_or_default();

        let leaves: Vec<_> = self
            .arena
            .children_sorted(idx, self.sort)
            .into_iter()
            .filter(|child| self.is_visible(*child))
            .map(|child| self.build(child))
            .collect();

        Tree::new(self.decorate(idx, label)).with_leaves(leaves)
    }

    fn is_visible(&self, idx: Index) -> bool {
        self.visible.as_ref().map_or(true, |v| v.contains(&idx))
    }

    fn decorate(&self, idx: Index, label: &str) -> String {
        let Some(pattern) = &self.pattern else {
            return label.to_string();
        };
        if !self.matched.contains(&idx) {
            return label.to_string();
        }
        match pattern.find(label) {
            Some(m) => format!(
                "{}{}{}",
                &label[..m.start()],
                m.as_str().yellow().bold(),
                &label[m.end()..]
            ),
            None => label.to_string(),
        }
    }
}
