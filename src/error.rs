//! Error types for tree configuration.

use thiserror::Error;

/// Errors raised while configuring a tree.
///
/// Rejected duplicates and queries against an empty tree are ordinary
/// outcomes (`false` / `None`), not errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The branching factor must allow at least one child per node.
    #[error("invalid branching factor: {0} (must be at least 1)")]
    InvalidBranching(usize),
}

pub type Result<T> = std::result::Result<T, TreeError>;
