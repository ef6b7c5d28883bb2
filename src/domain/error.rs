//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent structural violations of the input tree.
///
/// The transform itself is total; these only surface while turning raw
/// text into an `OrgNode`.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("malformed org chart: {message}")]
    MalformedInput { message: String },

    #[error("org chart root must be a mapping, found {found}")]
    RootNotMapping { found: String },
}
