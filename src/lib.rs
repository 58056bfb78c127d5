//! Bounded-branching similarity tree.
//!
//! [`NTree`] stores unique items of any type under a caller-supplied
//! [`Similarity`] (an ordering that decides identity plus a distance used
//! for ranking) and answers containment and nearest neighbor queries.
//!
//! ```
//! use ntree::{AbsoluteDifference, NTree};
//!
//! let mut tree = NTree::with_root_and_branching(10_i32, AbsoluteDifference, 4)?;
//! for key in [2, 5, 9, 6, 12, 15] {
//!     tree.add_data(key);
//! }
//! assert!(tree.contains_item(&9));
//! assert!(!tree.add_data(12));
//! assert_eq!(tree.get_nearest_neighbour(&7), Some(&6));
//! # Ok::<(), ntree::TreeError>(())
//! ```

mod config;
mod error;
mod node;
mod similarity;
mod tree;

pub use config::{RootNode, TreeConfig, DEFAULT_BRANCHING};
pub use error::{Result, TreeError};
pub use node::Node;
pub use similarity::{euclidean, AbsoluteDifference, Euclidean, FnSimilarity, Similarity};
pub use tree::{Iter, NTree, TreeStats};
