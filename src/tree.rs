use std::{cmp::Ordering, collections::BinaryHeap};

use conv::ValueFrom;
use ordered_float::OrderedFloat;
use tracing::{debug, trace};

use crate::{
    config::{RootNode, TreeConfig},
    error::Result,
    node::Node,
    similarity::Similarity,
};

/// An n-ary tree of unique items with nearest neighbor lookup.
///
/// Items are unique under [`Similarity::compare`]. Each node holds at most
/// `branching` children; once a node is full, new items are routed into one
/// of its children. Nodes live in an arena and every walk uses an explicit
/// stack, so degenerate (chain-like) trees are fine.
#[derive(Debug, Clone)]
pub struct NTree<T, S> {
    root: usize,
    nodes: Vec<Node<T>>,
    config: TreeConfig<S>,
}

/// Shape summary returned by [`NTree::stats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeStats {
    pub size: usize,
    pub height: usize,
    pub leaves: usize,
    pub max_fanout: usize,
    /// Mean number of children over nodes that have any.
    pub average_fanout: f64,
}

impl<T, S> NTree<T, S> {
    /// Empty tree with the default branching factor.
    #[must_use]
    pub fn new(similarity: S) -> Self {
        Self::from_config(TreeConfig::new(similarity))
    }

    /// Empty tree with an explicit branching factor.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidBranching`](crate::TreeError::InvalidBranching)
    /// if `branching` is zero.
    pub fn with_branching(similarity: S, branching: usize) -> Result<Self> {
        TreeConfig::with_branching(similarity, branching).map(Self::from_config)
    }

    /// Tree holding `root` with the default branching factor.
    #[must_use]
    pub fn with_root(root: T, similarity: S) -> Self {
        Self::from_root(RootNode::new(root, TreeConfig::new(similarity)))
    }

    /// # Errors
    ///
    /// Returns [`TreeError::InvalidBranching`](crate::TreeError::InvalidBranching)
    /// if `branching` is zero.
    pub fn with_root_and_branching(root: T, similarity: S, branching: usize) -> Result<Self> {
        let config = TreeConfig::with_branching(similarity, branching)?;
        Ok(Self::from_root(RootNode::new(root, config)))
    }

    /// Tree headed by a pre-built root; the strategy and branching factor are
    /// taken from the root's configuration.
    #[must_use]
    pub fn from_root(root: RootNode<T, S>) -> Self {
        let mut tree = Self::from_config(root.config);
        tree.root = tree.add_slot(root.key);
        tree
    }

    #[must_use]
    pub fn from_config(config: TreeConfig<S>) -> Self {
        NTree {
            root: usize::MAX,
            nodes: Vec::new(),
            config,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root == usize::MAX
    }

    /// Number of stored items, the root included.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.size()
    }

    #[must_use]
    pub fn branching(&self) -> usize {
        self.config.branching()
    }

    #[must_use]
    pub fn similarity(&self) -> &S {
        self.config.similarity()
    }

    #[must_use]
    pub fn root(&self) -> Option<&Node<T>> {
        self.nodes.get(self.root)
    }

    #[must_use]
    pub fn node(&self, slot_id: usize) -> Option<&Node<T>> {
        self.nodes.get(slot_id)
    }

    /// Items in pre-order, children visited in insertion order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        self.subtree(self.root)
    }

    /// Collects every stored item exactly once, in the order of [`iter`](Self::iter).
    #[must_use]
    pub fn traverse(&self) -> Vec<&T> {
        self.iter().collect()
    }

    /// Number of nodes on the longest root-to-leaf path (0 when empty).
    #[must_use]
    pub fn height(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        let mut height = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((node_id, depth)) = stack.pop() {
            height = height.max(depth);
            for &child_id in &self.nodes[node_id].children {
                stack.push((child_id, depth + 1));
            }
        }
        height
    }

    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let mut leaves = 0;
        let mut internal = 0;
        let mut edges = 0;
        let mut max_fanout = 0;
        for node in &self.nodes {
            let fanout = node.children.len();
            if node.is_leaf() {
                leaves += 1;
            } else {
                internal += 1;
                edges += fanout;
            }
            max_fanout = max_fanout.max(fanout);
        }

        let average_fanout = if internal == 0 {
            0.0
        } else {
            let edges = f64::value_from(edges).unwrap_or(f64::INFINITY);
            let internal = f64::value_from(internal).unwrap_or(f64::INFINITY);
            edges / internal
        };

        TreeStats {
            size: self.size(),
            height: self.height(),
            leaves,
            max_fanout,
            average_fanout,
        }
    }

    fn subtree(&self, slot_id: usize) -> Iter<'_, T> {
        let stack = if slot_id < self.nodes.len() {
            vec![slot_id]
        } else {
            Vec::new()
        };
        Iter {
            nodes: &self.nodes,
            stack,
        }
    }

    fn add_slot(&mut self, key: T) -> usize {
        let slot_id = self.nodes.len();
        self.nodes.push(Node::new(slot_id, key));
        slot_id
    }
}

impl<T, S: Similarity<T>> NTree<T, S> {
    /// Whether an item equal to `key` is stored. An empty tree contains nothing.
    #[must_use]
    pub fn contains_item(&self, key: &T) -> bool {
        !self.is_empty() && self.has_child(self.root, key)
    }

    /// Inserts `key` unless an equal item is already stored.
    ///
    /// Returns `true` if the tree grew. The first item of an empty tree
    /// becomes its root.
    pub fn add_data(&mut self, key: T) -> bool {
        if self.is_empty() {
            self.root = self.add_slot(key);
            debug!(slot = self.root, "promoted first item to root");
            return true;
        }
        self.add_child(self.root, key)
    }

    /// The stored item closest to `query`, or `None` when the tree is empty.
    ///
    /// Every node is scanned; ties go to the node visited first.
    #[must_use]
    pub fn get_nearest_neighbour(&self, query: &T) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let (slot_id, _) = self.most_similar(self.root, query);
        Some(&self.nodes[slot_id].key)
    }

    /// The `k` stored items closest to `query` with their distances,
    /// nearest first.
    #[must_use]
    pub fn nearest_neighbours(&self, query: &T, k: usize) -> Vec<(&T, f64)> {
        if k == 0 {
            return Vec::new();
        }
        let similarity = self.config.similarity();

        // Max-heap on (distance, visit order): the top is the current k-th.
        let mut neighbors = BinaryHeap::with_capacity(k.min(self.size()));
        let mut nodes = self.subtree(self.root);
        let mut visited = 0_usize;
        while let Some(node) = nodes.next_node() {
            let entry = (
                OrderedFloat(similarity.distance(&node.key, query)),
                visited,
                node.slot_id,
            );
            visited += 1;
            if neighbors.len() < k {
                neighbors.push(entry);
            } else if neighbors.peek().is_some_and(|kth| entry < *kth) {
                neighbors.pop();
                neighbors.push(entry);
            }
        }

        neighbors
            .into_sorted_vec()
            .into_iter()
            .map(|(distance, _, slot_id)| (&self.nodes[slot_id].key, distance.into_inner()))
            .collect()
    }

    /// Every stored item within `radius` of `query`, in pre-order.
    #[must_use]
    pub fn within(&self, query: &T, radius: f64) -> Vec<&T> {
        let similarity = self.config.similarity();
        self.iter()
            .filter(|key| similarity.distance(key, query) <= radius)
            .collect()
    }

    fn has_child(&self, slot_id: usize, candidate: &T) -> bool {
        let similarity = self.config.similarity();
        self.subtree(slot_id)
            .any(|key| similarity.compare(key, candidate).is_eq())
    }

    // Insert below `slot_id`, appending to the first node on the route
    // that still has room.
    fn add_child(&mut self, slot_id: usize, candidate: T) -> bool {
        if self.has_child(slot_id, &candidate) {
            debug!(slot = slot_id, "rejected duplicate item");
            return false;
        }

        let mut node_id = slot_id;
        let mut depth = 0;
        while self.nodes[node_id].children.len() >= self.config.branching() {
            node_id = self.choose_subtree(node_id, &candidate);
            depth += 1;
        }

        let child_id = self.add_slot(candidate);
        self.nodes[node_id].children.push(child_id);
        trace!(parent = node_id, slot = child_id, depth, "appended item");
        true
    }

    // Route into the greatest child ordered below the candidate, or else the
    // least child ordered above it.
    fn choose_subtree(&self, node_id: usize, candidate: &T) -> usize {
        let similarity = self.config.similarity();
        let children = &self.nodes[node_id].children;

        let mut predecessor: Option<usize> = None;
        let mut successor: Option<usize> = None;
        for &child_id in children {
            let child = &self.nodes[child_id].key;
            if similarity.compare(child, candidate) == Ordering::Less {
                let closer = predecessor.map_or(true, |best| {
                    similarity.compare(child, &self.nodes[best].key) == Ordering::Greater
                });
                if closer {
                    predecessor = Some(child_id);
                }
            } else {
                let closer = successor.map_or(true, |best| {
                    similarity.compare(child, &self.nodes[best].key) == Ordering::Less
                });
                if closer {
                    successor = Some(child_id);
                }
            }
        }

        predecessor.or(successor).unwrap_or(children[0])
    }

    fn most_similar(&self, slot_id: usize, query: &T) -> (usize, f64) {
        let similarity = self.config.similarity();
        let mut best_slot = slot_id;
        let mut best_distance = OrderedFloat(f64::NAN);

        let mut nodes = self.subtree(slot_id);
        while let Some(node) = nodes.next_node() {
            let distance = OrderedFloat(similarity.distance(&node.key, query));
            // NaN orders last, so it only survives if nothing else exists.
            if distance < best_distance {
                best_distance = distance;
                best_slot = node.slot_id;
            }
        }
        (best_slot, best_distance.into_inner())
    }
}

impl<T, S: Default> Default for NTree<T, S> {
    fn default() -> Self {
        Self::from_config(TreeConfig::default())
    }
}

/// Pre-order iterator over the items of an [`NTree`].
pub struct Iter<'a, T> {
    nodes: &'a [Node<T>],
    stack: Vec<usize>,
}

impl<'a, T> Iter<'a, T> {
    fn next_node(&mut self) -> Option<&'a Node<T>> {
        let nodes = self.nodes;
        let node = &nodes[self.stack.pop()?];
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_node().map(|node| &node.key)
    }
}

impl<'a, T, S> IntoIterator for &'a NTree<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::NTree;
    use crate::{AbsoluteDifference, FnSimilarity, RootNode, TreeConfig, TreeError};

    fn scenario() -> NTree<i32, AbsoluteDifference> {
        let mut tree =
            NTree::with_root_and_branching(10, AbsoluteDifference, 4).expect("Invalid branching");
        for key in [2, 5, 9, 6, 12, 15] {
            assert!(tree.add_data(key));
        }
        tree
    }

    fn keys(tree: &NTree<i32, AbsoluteDifference>, slot_ids: &[usize]) -> Vec<i32> {
        slot_ids.iter().map(|&id| tree.nodes[id].key).collect()
    }

    #[test]
    fn fills_root_then_routes() {
        let tree = scenario();

        // The root takes the first four items in arrival order
        let root = tree.root().expect("root");
        assert_eq!(*root.key(), 10);
        assert_eq!(keys(&tree, root.children()), vec![2, 5, 9, 6]);

        // 12 and 15 both route to 9, the greatest child below them
        let nine = tree.nodes[root.children()[2]].children.clone();
        assert_eq!(keys(&tree, &nine), vec![12, 15]);
        assert_eq!(tree.height(), 3);
    }

    #[test]
    fn choose_subtree() {
        let tree = scenario();
        let root = tree.root;
        let route = |key: i32| tree.nodes[tree.choose_subtree(root, &key)].key;

        assert_eq!(route(7), 6);
        assert_eq!(route(100), 9);
        assert_eq!(route(3), 2);
        // Nothing below 1, so the least child above it
        assert_eq!(route(1), 2);
        assert_eq!(route(-50), 2);
    }

    #[test]
    fn rejects_duplicates() {
        let mut tree = scenario();
        let size = tree.size();
        for key in [9, 12, 10, 15, 2] {
            assert!(!tree.add_data(key));
        }
        assert_eq!(tree.size(), size);
        assert_eq!(tree.nodes.len(), 7);
    }

    #[test]
    fn nearest_neighbour() {
        let tree = scenario();
        assert_eq!(tree.get_nearest_neighbour(&7), Some(&6));
        assert_eq!(tree.get_nearest_neighbour(&16), Some(&15));
        assert_eq!(tree.get_nearest_neighbour(&0), Some(&2));
        assert_eq!(tree.get_nearest_neighbour(&10), Some(&10));
    }

    #[test]
    fn nearest_neighbour_ties_keep_first_visited() {
        // Pre-order visits 10, 2, 5, 9, 12, 15, 6: for 11 both 10 and 12 are at
        // distance 1 and 10 comes first.
        let tree = scenario();
        assert_eq!(tree.get_nearest_neighbour(&11), Some(&10));
        let (slot_id, distance) = tree.most_similar(tree.root, &11);
        assert_eq!(tree.nodes[slot_id].key, 10);
        assert_eq!(distance, 1.0);

        let knn = tree.nearest_neighbours(&11, 2);
        assert_eq!(knn, vec![(&10, 1.0), (&12, 1.0)]);
    }

    #[test]
    fn nan_distance_never_wins() {
        let sim = FnSimilarity::new(
            |a: &i32, b: &i32| a.cmp(b),
            |a: &i32, b: &i32| {
                if *a == 0 {
                    f64::NAN
                } else {
                    f64::from((a - b).abs())
                }
            },
        );
        let mut tree = NTree::with_root(0, sim);
        assert_eq!(tree.get_nearest_neighbour(&5), Some(&0));
        tree.add_data(40);
        assert_eq!(tree.get_nearest_neighbour(&5), Some(&40));
    }

    #[test]
    fn traversal_is_preorder() {
        let tree = scenario();
        assert_eq!(tree.traverse(), vec![&10, &2, &5, &9, &12, &15, &6]);
        assert_eq!((&tree).into_iter().count(), 7);
    }

    #[test]
    fn k_nearest_and_range() {
        let tree = scenario();
        let knn = tree.nearest_neighbours(&7, 3);
        assert_eq!(knn, vec![(&6, 1.0), (&5, 2.0), (&9, 2.0)]);
        assert!(tree.nearest_neighbours(&7, 0).is_empty());
        assert_eq!(tree.nearest_neighbours(&7, 100).len(), 7);

        let mut near = tree.within(&11, 1.0);
        near.sort();
        assert_eq!(near, vec![&10, &12]);
        assert!(tree.within(&100, 10.0).is_empty());
    }

    #[test]
    fn empty_tree() {
        let mut tree: NTree<i32, _> = NTree::new(AbsoluteDifference);
        assert!(tree.is_empty());
        assert_eq!(tree.size(), 0);
        assert_eq!(tree.height(), 0);
        assert!(!tree.contains_item(&3));
        assert_eq!(tree.get_nearest_neighbour(&3), None);
        assert!(tree.nearest_neighbours(&3, 4).is_empty());
        assert!(tree.traverse().is_empty());
        assert!(tree.root().is_none());

        assert!(tree.add_data(3));
        assert!(!tree.is_empty());
        assert_eq!(tree.size(), 1);
        assert!(tree.contains_item(&3));
        assert_eq!(tree.get_nearest_neighbour(&100), Some(&3));
    }

    #[test]
    fn constructors() {
        let tree: NTree<i32, AbsoluteDifference> = NTree::default();
        assert_eq!(tree.branching(), 8);
        assert!(tree.is_empty());

        let tree = NTree::with_root(1_i32, AbsoluteDifference);
        assert_eq!(tree.branching(), 8);
        assert_eq!(tree.size(), 1);

        let config = TreeConfig::with_branching(AbsoluteDifference, 3).expect("Invalid branching");
        let tree = NTree::from_root(RootNode::new(7_i32, config));
        assert_eq!(tree.branching(), 3);
        assert_eq!(tree.size(), 1);
        assert!(tree.contains_item(&7));

        let err = NTree::<i32, _>::with_branching(AbsoluteDifference, 0).unwrap_err();
        assert_eq!(err, TreeError::InvalidBranching(0));
        assert!(NTree::with_root_and_branching(1_i32, AbsoluteDifference, 0).is_err());
    }

    #[test]
    fn stats() {
        let tree = scenario();
        let stats = tree.stats();
        assert_eq!(stats.size, 7);
        assert_eq!(stats.height, 3);
        assert_eq!(stats.leaves, 5);
        assert_eq!(stats.max_fanout, 4);
        assert_eq!(stats.average_fanout, 3.0);

        let lone = NTree::with_root(1_i32, AbsoluteDifference).stats();
        assert_eq!(lone.leaves, 1);
        assert_eq!(lone.average_fanout, 0.0);
    }

    #[test]
    fn degenerate_chain() {
        // Branching factor 1 with ascending keys builds a single path
        let n = 5_000;
        let mut tree = NTree::with_branching(AbsoluteDifference, 1).expect("Invalid branching");
        for key in 0..n {
            assert!(tree.add_data(key));
        }
        assert_eq!(tree.size(), 5_000);
        assert_eq!(tree.height(), 5_000);
        assert!(tree.contains_item(&(n - 1)));
        assert!(!tree.contains_item(&n));
        assert_eq!(tree.get_nearest_neighbour(&(n + 10)), Some(&(n - 1)));
        assert_eq!(tree.traverse().len(), 5_000);
    }
}
