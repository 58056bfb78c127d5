/// A node of an [`NTree`](crate::NTree): one item and the arena slots of its
/// children, in insertion order.
///
/// Nodes hold no strategy of their own. Every comparison goes through the
/// tree's [`Similarity`](crate::Similarity).
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub(crate) slot_id: usize,
    pub(crate) key: T,
    pub(crate) children: Vec<usize>,
}

impl<T> Node<T> {
    #[must_use]
    pub(crate) fn new(slot_id: usize, key: T) -> Node<T> {
        Node {
            slot_id,
            key,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &T {
        &self.key
    }

    /// Arena slot of this node within its tree.
    #[must_use]
    pub fn slot_id(&self) -> usize {
        self.slot_id
    }

    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
