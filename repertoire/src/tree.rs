//! Owned position tree built from PGN movetext.

use chess::Position;

/// One node of a chapter's position tree.
///
/// Children are kept in the order they appear in the source text: the first
/// child continues the main line, later children are alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionNode {
    pub position: Position,
    pub children: Vec<PositionNode>,
}

impl PositionNode {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            children: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn main_child(&self) -> Option<&PositionNode> {
        self.children.first()
    }

    /// Index of the child reached by the given UCI move.
    pub fn child_for(&self, uci: &str) -> Option<usize> {
        self.children.iter().position(|child| {
            child
                .position
                .last_move()
                .is_some_and(|mv| mv.uci == uci)
        })
    }

    /// Follow a path of child indices from this node.
    pub fn node_at(&self, path: &[usize]) -> Option<&PositionNode> {
        path.iter()
            .try_fold(self, |node, &idx| node.children.get(idx))
    }

    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut PositionNode> {
        path.iter()
            .try_fold(self, |node, &idx| node.children.get_mut(idx))
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Number of leaves in this subtree. A root without children counts as
    /// zero leaves: an empty chapter has nothing to practice.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            return 0;
        }
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                count += 1;
            }
            stack.extend(node.children.iter());
        }
        count
    }

    /// Length of the longest root-to-leaf path in plies.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.children.iter().map(|child| (child, depth + 1)));
        }
        deepest
    }
}
