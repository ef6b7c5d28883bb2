//! Domain layer: the org chart transform and its data structures
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod cleaner;
pub mod entities;
pub mod error;
pub mod grouping;
pub mod pipeline;
pub mod similarity;

pub use arena::{NodeData, SortOrder, TreeArena, TreeNode};
pub use cleaner::clean;
pub use entities::OrgNode;
pub use error::DomainError;
pub use grouping::{common_prefix, group, pair_prefix, PrefixGroup, PrefixGrouper};
pub use pipeline::{process, rejected_labels, Pipeline, PipelineOptions};
pub use similarity::{are_similar, choose_canonical, dedupe, normalize_for_comparison, SimilarityMerger};
