use crate::error::{Result, TreeError};

/// Branching factor used when the caller does not supply one.
pub const DEFAULT_BRANCHING: usize = 8;

/// The immutable settings every node of a tree shares: the similarity
/// strategy and the branching factor `N`.
#[derive(Debug, Clone)]
pub struct TreeConfig<S> {
    similarity: S,
    branching: usize,
}

impl<S> TreeConfig<S> {
    #[must_use]
    pub fn new(similarity: S) -> Self {
        TreeConfig {
            similarity,
            branching: DEFAULT_BRANCHING,
        }
    }

    /// # Errors
    ///
    /// Returns [`TreeError::InvalidBranching`] if `branching` is zero.
    pub fn with_branching(similarity: S, branching: usize) -> Result<Self> {
        if branching == 0 {
            return Err(TreeError::InvalidBranching(branching));
        }
        Ok(TreeConfig {
            similarity,
            branching,
        })
    }

    #[must_use]
    pub fn similarity(&self) -> &S {
        &self.similarity
    }

    #[must_use]
    pub fn branching(&self) -> usize {
        self.branching
    }
}

impl<S: Default> Default for TreeConfig<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

/// A root item bundled with the configuration of the tree it will head.
#[derive(Debug, Clone)]
pub struct RootNode<T, S> {
    pub(crate) key: T,
    pub(crate) config: TreeConfig<S>,
}

impl<T, S> RootNode<T, S> {
    #[must_use]
    pub fn new(key: T, config: TreeConfig<S>) -> Self {
        RootNode { key, config }
    }

    #[must_use]
    pub fn key(&self) -> &T {
        &self.key
    }

    #[must_use]
    pub fn config(&self) -> &TreeConfig<S> {
        &self.config
    }
}
