use std::fmt::Debug;

use crate::space::Action;
use crate::space::Cost;
use crate::space::Path;
use crate::space::Space;
use crate::space::State;

/// A reference to a `SearchTreeNode<St, A, C>` within its `SearchTree`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SearchTreeIndex {
    index: usize,
}

impl SearchTreeIndex {
    #[inline(always)]
    fn new(index: usize) -> Self {
        Self { index }
    }

    #[inline(always)]
    pub fn get(&self) -> usize {
        self.index
    }
}

/// A reached State, together with the step that produced it.
///
/// Nodes are never mutated after being pushed into the tree. A node only
/// exists for a State that had not been seen before, so parent chains are
/// finite and acyclic.
#[derive(Clone, Debug)]
pub struct SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub(crate) parent: Option<(SearchTreeIndex, A)>,
    pub(crate) state: St,
    /// Accumulated cost from the root. On unit-cost spaces this is the depth.
    pub(crate) g: C,
}

impl<St, A, C> SearchTreeNode<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    pub fn new(s: St, parent: Option<(SearchTreeIndex, A)>, g: C) -> Self {
        Self {
            parent,
            state: s,
            g,
        }
    }

    #[inline(always)]
    pub fn state(&self) -> &St {
        &self.state
    }
    #[inline(always)]
    pub fn parent(&self) -> Option<SearchTreeIndex> {
        self.parent.map(|(i, _a)| i)
    }
    #[inline(always)]
    pub fn action(&self) -> Option<A> {
        self.parent.map(|(_i, a)| a)
    }
    #[inline(always)]
    pub fn g(&self) -> C {
        self.g
    }
}

/// An append-only arena of `SearchTreeNode`s.
pub struct SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    nodes: Vec<SearchTreeNode<St, A, C>>,
}

impl<St, A, C> SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: vec![] }
    }

    #[inline(always)]
    pub fn push(&mut self, node: SearchTreeNode<St, A, C>) -> SearchTreeIndex {
        debug_assert!(
            node.parent.is_none_or(|(p, _a)| p.index < self.nodes.len()),
            "Parents must exist before their children"
        );
        let index = SearchTreeIndex::new(self.nodes.len());
        self.nodes.push(node);
        index
    }

    #[inline(always)]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Number of parent links between a node and its root.
    #[must_use]
    pub fn depth(&self, mut node_index: SearchTreeIndex) -> usize {
        let mut depth = 0usize;
        while let Some(parent_index) = self[node_index].parent() {
            depth += 1;
            node_index = parent_index;
        }
        depth
    }

    /// Reconstructs the Path from the root of the tree to the given node.
    #[must_use]
    pub fn path<Sp: Space<St, A, C>>(
        &self,
        space: &Sp,
        mut node_index: SearchTreeIndex,
    ) -> Path<St, A, C> {
        #[cfg(feature = "coz_profile")]
        coz::scope!("PathReconstruction");

        let mut reversed_steps = Vec::<(St, A, C)>::new();
        while let Some((parent_index, a)) = self[node_index].parent {
            debug_assert!(parent_index.index < node_index.index);
            let s = *self[node_index].state();
            let c: C = space.cost(self[parent_index].state(), &a);
            debug_assert!(c != C::zero());

            reversed_steps.push((s, a, c));
            node_index = parent_index;
        }

        let mut path = Path::<St, A, C>::new_from_start(*self[node_index].state());
        for (s, a, c) in reversed_steps.into_iter().rev() {
            path.append((s, a), c);
        }
        debug_assert!(path.seems_valid());
        path
    }
}

impl<St, A, C> Default for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl<St, A, C> std::ops::Index<SearchTreeIndex> for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    type Output = SearchTreeNode<St, A, C>;

    #[inline(always)]
    fn index(&self, index: SearchTreeIndex) -> &Self::Output {
        &self.nodes[index.index]
    }
}

impl<St, A, C> std::fmt::Debug for SearchTree<St, A, C>
where
    St: State,
    A: Action,
    C: Cost,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "SearchTree{{({} nodes)}}", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::problems::maze_2d::Maze2DAction;
    use crate::problems::maze_2d::Maze2DCost;
    use crate::problems::maze_2d::Maze2DSpace;
    use crate::problems::maze_2d::Maze2DState;

    fn s(row: usize, col: usize) -> Maze2DState {
        Maze2DState::new_from_usize(row, col).unwrap()
    }

    #[test]
    fn path_from_root_is_empty() {
        let space = Maze2DSpace::new_empty_with_dimensions(2, 2);
        let mut tree = SearchTree::<Maze2DState, Maze2DAction, Maze2DCost>::new();
        let root = tree.push(SearchTreeNode::new(s(1, 1), None, 0));

        let path = tree.path(&space, root);
        assert!(path.is_empty());
        assert_eq!(path.start, s(1, 1));
        assert_eq!(path.end, s(1, 1));
        assert_eq!(path.cost, 0);
        assert_eq!(tree.depth(root), 0);
    }

    #[test]
    fn path_follows_parents() {
        let space = Maze2DSpace::new_empty_with_dimensions(3, 3);
        let mut tree = SearchTree::<Maze2DState, Maze2DAction, Maze2DCost>::new();
        let root = tree.push(SearchTreeNode::new(s(0, 0), None, 0));
        let a = tree.push(SearchTreeNode::new(
            s(0, 1),
            Some((root, Maze2DAction::Right)),
            1,
        ));
        // A sibling that must not show up in the path.
        let _b = tree.push(SearchTreeNode::new(
            s(1, 0),
            Some((root, Maze2DAction::Down)),
            1,
        ));
        let c = tree.push(SearchTreeNode::new(
            s(1, 1),
            Some((a, Maze2DAction::Down)),
            2,
        ));

        let path = tree.path(&space, c);
        assert_eq!(path.start, s(0, 0));
        assert_eq!(path.end, s(1, 1));
        assert_eq!(path.cost, 2);
        assert_eq!(
            path.steps,
            vec![(s(0, 1), Maze2DAction::Right), (s(1, 1), Maze2DAction::Down)]
        );
        assert_eq!(tree.depth(c), 2);
        assert_eq!(tree[c].action(), Some(Maze2DAction::Down));
        assert_eq!(tree[c].parent(), Some(a));
    }
}
