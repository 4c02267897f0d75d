//! Compact Tree
//!
//! A forest stored in a single `Vec` in pre-order. Every node records how many
//! slots its branch occupies (`branch_stride`) and how far back its parent is
//! (`parent_ofs`), so a subtree is always one contiguous slice:
//!
//! ```text
//! index        0     1      2       3      4
//! payload      Hips  Spine  Chest   LegL   Root2
//! stride       4     2      1       1      1
//! parent_ofs   0     1      1       3      0
//! ```
//!
//! # Layout invariants
//!
//! - The branch of the node at `i` is exactly `[i, i + branch_stride)`.
//! - The first child of `i` is at `i + 1`; each next sibling follows the
//!   previous sibling's branch.
//! - A non-root's `parent_ofs` is its index minus its parent's index. Roots
//!   have `parent_ofs == 0`.
//! - The array is a concatenation of independent trees.
//!
//! Structural edits cost O(size of the enclosing tree). Traversals never
//! touch strides or offsets, and a parent always precedes its children, which
//! is what makes single-pass transform propagation possible.
//!
//! Debug builds re-check every invariant after each edit.

use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

use smallvec::SmallVec;

use crate::errors::{Result, SinewError};

/// Position of a node in a [`CompactTree`].
///
/// Indices are only stable until the next structural edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(usize);

impl NodeIndex {
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for NodeIndex {
    #[inline]
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One slot of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    nbr_children: usize,
    branch_stride: usize,
    parent_ofs: usize,
    pub payload: T,
}

impl<T> TreeNode<T> {
    fn leaf(payload: T, parent_ofs: usize) -> Self {
        Self {
            nbr_children: 0,
            branch_stride: 1,
            parent_ofs,
            payload,
        }
    }

    /// Number of direct children.
    #[inline]
    #[must_use]
    pub fn nbr_children(&self) -> usize {
        self.nbr_children
    }

    /// Slots taken by this node and its whole subtree (always >= 1).
    #[inline]
    #[must_use]
    pub fn branch_stride(&self) -> usize {
        self.branch_stride
    }

    /// Distance back to the parent, 0 for roots.
    #[inline]
    #[must_use]
    pub fn parent_ofs(&self) -> usize {
        self.parent_ofs
    }

    #[inline]
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_ofs == 0
    }
}

/// Branch removed from a tree, kept in pre-order together with each node's
/// parent offset relative to the branch (0 for the branch top).
type DetachedBranch<T> = Vec<(T, usize)>;

/// Array-backed, pre-ordered forest.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactTree<T> {
    nodes: Vec<TreeNode<T>>,
}

impl<T> Default for CompactTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompactTree<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[TreeNode<T>] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: NodeIndex) -> Option<&TreeNode<T>> {
        self.nodes.get(index.0)
    }

    /// Returns the slot at `index`. Panics when out of range.
    #[inline]
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &TreeNode<T> {
        assert!(index.0 < self.nodes.len(), "node index {index} out of range");
        &self.nodes[index.0]
    }

    #[inline]
    #[must_use]
    pub fn payload(&self, index: NodeIndex) -> &T {
        &self.node(index).payload
    }

    #[inline]
    pub fn payload_mut(&mut self, index: NodeIndex) -> &mut T {
        assert!(index.0 < self.nodes.len(), "node index {index} out of range");
        &mut self.nodes[index.0].payload
    }

    #[must_use]
    pub fn parent_index(&self, index: NodeIndex) -> Option<NodeIndex> {
        let ofs = self.node(index).parent_ofs;
        (ofs != 0).then(|| NodeIndex(index.0 - ofs))
    }

    /// Slot range covered by the branch rooted at `index`.
    #[must_use]
    pub fn branch_range(&self, index: NodeIndex) -> Range<usize> {
        index.0..index.0 + self.node(index).branch_stride
    }

    /// Walks the direct children of `index` using the stride chain.
    #[must_use]
    pub fn children(&self, index: NodeIndex) -> Children<'_, T> {
        let node = self.node(index);
        Children {
            nodes: &self.nodes,
            next: index.0 + 1,
            remaining: node.nbr_children,
        }
    }

    /// Walks the root of every tree in the forest.
    #[must_use]
    pub fn roots(&self) -> Roots<'_, T> {
        Roots {
            nodes: &self.nodes,
            next: 0,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &TreeNode<T>)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeIndex(i), n))
    }

    #[must_use]
    pub fn find_index_by(&self, mut predicate: impl FnMut(&T) -> bool) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .position(|n| predicate(&n.payload))
            .map(NodeIndex)
    }

    /// Number of ancestors between `index` and its root.
    #[must_use]
    pub fn depth_of(&self, index: NodeIndex) -> usize {
        let mut depth = 0;
        self.ascend(index, |_, _| depth += 1);
        depth - 1
    }

    fn root_of(&self, mut i: usize) -> usize {
        loop {
            let ofs = self.nodes[i].parent_ofs;
            if ofs == 0 {
                return i;
            }
            i -= ofs;
        }
    }

    // ========================================================================
    // Structural Edits (index based)
    // ========================================================================

    /// Appends a new one-node tree at the end of the forest.
    pub fn insert_as_root(&mut self, payload: T) -> NodeIndex {
        self.nodes.push(TreeNode::leaf(payload, 0));
        NodeIndex(self.nodes.len() - 1)
    }

    /// Inserts `payload` as the first child of `parent`.
    pub fn insert_at(&mut self, payload: T, parent: NodeIndex) -> NodeIndex {
        self.insert_child_slot(payload, parent, parent.0 + 1)
    }

    /// Inserts `payload` as the last child of `parent`.
    pub fn append_child_at(&mut self, payload: T, parent: NodeIndex) -> NodeIndex {
        let slot = parent.0 + self.node(parent).branch_stride;
        self.insert_child_slot(payload, parent, slot)
    }

    /// Inserts a leaf at `slot`, which must lie inside `parent`'s branch or
    /// directly after it.
    fn insert_child_slot(&mut self, payload: T, parent: NodeIndex, slot: usize) -> NodeIndex {
        let p = parent.0;
        assert!(p < self.nodes.len(), "parent index {parent} out of range");
        assert!(
            slot > p && slot <= p + self.nodes[p].branch_stride,
            "insertion slot {slot} outside the branch of {parent}"
        );

        let root = self.root_of(p);
        let root_end = root + self.nodes[root].branch_stride;

        // Every ancestor's branch reaches the insertion slot and grows by one.
        let mut a = p;
        loop {
            self.nodes[a].branch_stride += 1;
            let ofs = self.nodes[a].parent_ofs;
            if ofs == 0 {
                break;
            }
            a -= ofs;
        }

        // Nodes that shift right while their parent stays put.
        for j in slot..root_end {
            let node = &mut self.nodes[j];
            if j - node.parent_ofs < slot {
                node.parent_ofs += 1;
            }
        }

        self.nodes[p].nbr_children += 1;
        self.nodes.insert(slot, TreeNode::leaf(payload, slot - p));

        self.debug_check();
        NodeIndex(slot)
    }

    /// Removes the branch rooted at `index` and returns how many slots it held.
    pub fn erase_branch_at(&mut self, index: NodeIndex) -> usize {
        self.take_branch(index).len()
    }

    /// Moves the branch at `node` to become the last child of `new_parent`.
    ///
    /// Panics when `new_parent` lies inside the moved branch.
    pub fn reparent_at(&mut self, node: NodeIndex, new_parent: NodeIndex) -> NodeIndex {
        let range = self.branch_range(node);
        assert!(
            new_parent.0 < self.nodes.len() && !range.contains(&new_parent.0),
            "cannot reparent {node} under its own descendant {new_parent}"
        );

        let stride = range.len();
        let branch = self.take_branch(node);
        let parent = if new_parent.0 > node.0 {
            NodeIndex(new_parent.0 - stride)
        } else {
            new_parent
        };
        let moved = self.splice_branch(branch, Some(parent));
        log::trace!("Moved branch of {stride} nodes from {node} to {moved} under {parent}");
        moved
    }

    /// Detaches the branch at `node` and appends it as a new tree.
    /// A root is left where it is.
    pub fn unparent_at(&mut self, node: NodeIndex) -> NodeIndex {
        if self.node(node).is_root() {
            return node;
        }
        let branch = self.take_branch(node);
        let moved = self.splice_branch(branch, None);
        log::trace!("Detached {node} as a new tree at {moved}");
        moved
    }

    fn take_branch(&mut self, index: NodeIndex) -> DetachedBranch<T> {
        let e = index.0;
        assert!(e < self.nodes.len(), "node index {index} out of range");
        let stride = self.nodes[e].branch_stride;
        let ofs = self.nodes[e].parent_ofs;

        if ofs != 0 {
            let p = e - ofs;
            let root = self.root_of(p);
            let root_end = root + self.nodes[root].branch_stride;

            let mut a = p;
            loop {
                self.nodes[a].branch_stride -= stride;
                let a_ofs = self.nodes[a].parent_ofs;
                if a_ofs == 0 {
                    break;
                }
                a -= a_ofs;
            }

            // Nodes after the branch whose parent sits before it close the gap.
            for j in e + stride..root_end {
                let node = &mut self.nodes[j];
                if j - node.parent_ofs < e {
                    node.parent_ofs -= stride;
                }
            }

            self.nodes[p].nbr_children -= 1;
        }

        let branch = self
            .nodes
            .drain(e..e + stride)
            .enumerate()
            .map(|(k, n)| (n.payload, if k == 0 { 0 } else { n.parent_ofs }))
            .collect();

        self.debug_check();
        branch
    }

    /// Re-inserts a detached branch node by node, preserving the relative
    /// parent offsets recorded when it was taken out.
    fn splice_branch(&mut self, branch: DetachedBranch<T>, parent: Option<NodeIndex>) -> NodeIndex {
        // Appending as last child in pre-order never shifts an already placed node.
        let mut placed: SmallVec<[usize; 16]> = SmallVec::with_capacity(branch.len());
        for (k, (payload, rel)) in branch.into_iter().enumerate() {
            let index = if k == 0 {
                match parent {
                    Some(p) => self.append_child_at(payload, p),
                    None => self.insert_as_root(payload),
                }
            } else {
                let p = NodeIndex(placed[k - rel]);
                self.append_child_at(payload, p)
            };
            placed.push(index.0);
        }
        NodeIndex(placed[0])
    }

    // ========================================================================
    // Traversals
    // ========================================================================

    /// Visits the branch at `start` in layout order. Each call receives
    /// `(node, parent, node_index, parent_index)`; a parent is always visited
    /// before any of its children.
    pub fn traverse_progressive<F>(&self, start: NodeIndex, mut visit: F)
    where
        F: FnMut(&T, Option<&T>, NodeIndex, Option<NodeIndex>),
    {
        for i in self.branch_range(start) {
            let node = &self.nodes[i];
            let parent = (node.parent_ofs != 0).then(|| i - node.parent_ofs);
            visit(
                &node.payload,
                parent.map(|p| &self.nodes[p].payload),
                NodeIndex(i),
                parent.map(NodeIndex),
            );
        }
    }

    /// [`Self::traverse_progressive`] over every tree of the forest.
    pub fn traverse_progressive_all<F>(&self, mut visit: F)
    where
        F: FnMut(&T, Option<&T>, NodeIndex, Option<NodeIndex>),
    {
        let roots: SmallVec<[NodeIndex; 4]> = self.roots().collect();
        for root in roots {
            self.traverse_progressive(root, &mut visit);
        }
    }

    /// Mutable progressive walk: the visited node is writable while its
    /// parent, already finalized in this pass, is readable.
    pub fn traverse_progressive_mut<F>(&mut self, start: NodeIndex, mut visit: F)
    where
        F: FnMut(&mut T, Option<&T>, NodeIndex, Option<NodeIndex>),
    {
        for i in self.branch_range(start) {
            let ofs = self.nodes[i].parent_ofs;
            let (head, tail) = self.nodes.split_at_mut(i);
            let node = &mut tail[0];
            if ofs == 0 {
                visit(&mut node.payload, None, NodeIndex(i), None);
            } else {
                let p = i - ofs;
                visit(
                    &mut node.payload,
                    Some(&head[p].payload),
                    NodeIndex(i),
                    Some(NodeIndex(p)),
                );
            }
        }
    }

    /// [`Self::traverse_progressive_mut`] over every tree of the forest.
    pub fn traverse_progressive_all_mut<F>(&mut self, mut visit: F)
    where
        F: FnMut(&mut T, Option<&T>, NodeIndex, Option<NodeIndex>),
    {
        let mut root = 0;
        while root < self.nodes.len() {
            let stride = self.nodes[root].branch_stride;
            self.traverse_progressive_mut(NodeIndex(root), &mut visit);
            root += stride;
        }
    }

    /// Depth-first walk following child links.
    pub fn traverse_depthfirst<F>(&self, start: NodeIndex, mut visit: F)
    where
        F: FnMut(&T, NodeIndex),
    {
        self.traverse_depthfirst_with_level(start, |payload, index, _| visit(payload, index));
    }

    /// Depth-first walk; `level` is 0 for `start`.
    pub fn traverse_depthfirst_with_level<F>(&self, start: NodeIndex, mut visit: F)
    where
        F: FnMut(&T, NodeIndex, usize),
    {
        self.depthfirst_rec(start, 0, &mut visit);
    }

    fn depthfirst_rec<F>(&self, index: NodeIndex, level: usize, visit: &mut F)
    where
        F: FnMut(&T, NodeIndex, usize),
    {
        visit(&self.nodes[index.0].payload, index, level);
        for child in self.children(index) {
            self.depthfirst_rec(child, level + 1, visit);
        }
    }

    /// Level-by-level walk of the branch at `start`.
    pub fn traverse_breadthfirst<F>(&self, start: NodeIndex, mut visit: F)
    where
        F: FnMut(&T, NodeIndex),
    {
        let mut queue = VecDeque::with_capacity(self.node(start).branch_stride);
        queue.push_back(start);
        while let Some(index) = queue.pop_front() {
            visit(&self.nodes[index.0].payload, index);
            queue.extend(self.children(index));
        }
    }

    /// Walks from `start` up to its root, `start` included.
    pub fn ascend<F>(&self, start: NodeIndex, mut visit: F)
    where
        F: FnMut(&T, NodeIndex),
    {
        let mut i = start.0;
        loop {
            let node = self.node(NodeIndex(i));
            visit(&node.payload, NodeIndex(i));
            if node.parent_ofs == 0 {
                break;
            }
            i -= node.parent_ofs;
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Checks every layout invariant and reports the first violation.
    pub fn validate(&self) -> Result<()> {
        let len = self.nodes.len();
        let violation = |index: usize, reason: String| SinewError::LayoutViolation { index, reason };

        for (i, node) in self.nodes.iter().enumerate() {
            if node.branch_stride == 0 || i + node.branch_stride > len {
                return Err(violation(i, format!("stride {} overruns the array", node.branch_stride)));
            }

            let mut child = i + 1;
            let mut count = 0;
            let end = i + node.branch_stride;
            while child < end {
                let c = &self.nodes[child];
                if c.parent_ofs != child - i {
                    return Err(violation(
                        child,
                        format!("parent offset {} but parent is at {i}", c.parent_ofs),
                    ));
                }
                count += 1;
                child += c.branch_stride;
            }
            if child != end {
                return Err(violation(i, "children do not tile the branch".to_owned()));
            }
            if count != node.nbr_children {
                return Err(violation(
                    i,
                    format!("{} children recorded, {count} found", node.nbr_children),
                ));
            }
        }

        let mut root = 0;
        while root < len {
            if self.nodes[root].parent_ofs != 0 {
                return Err(violation(root, "tree boundary is not a root".to_owned()));
            }
            root += self.nodes[root].branch_stride;
        }
        Ok(())
    }

    #[inline]
    fn debug_check(&self) {
        if cfg!(debug_assertions) {
            if let Err(err) = self.validate() {
                panic!("{err}");
            }
        }
    }
}

// ============================================================================
// Structural Edits (payload based)
// ============================================================================

impl<T: PartialEq + fmt::Debug> CompactTree<T> {
    /// Linear scan for the first slot whose payload equals `payload`.
    #[must_use]
    pub fn find_index(&self, payload: &T) -> Option<NodeIndex> {
        self.find_index_by(|p| p == payload)
    }

    fn require(&self, payload: &T) -> Result<NodeIndex> {
        self.find_index(payload)
            .ok_or_else(|| SinewError::NodeNotFound(format!("{payload:?}")))
    }

    /// Inserts `payload` as the first child of the node equal to `parent`.
    /// The tree is untouched when the parent is missing.
    pub fn insert(&mut self, payload: T, parent: &T) -> Result<NodeIndex> {
        let p = self.require(parent)?;
        Ok(self.insert_at(payload, p))
    }

    /// Inserts `payload` as the last child of the node equal to `parent`.
    pub fn append_child(&mut self, payload: T, parent: &T) -> Result<NodeIndex> {
        let p = self.require(parent)?;
        Ok(self.append_child_at(payload, p))
    }

    /// Removes the node equal to `payload` together with its subtree.
    pub fn erase_branch(&mut self, payload: &T) -> Result<usize> {
        let index = self.require(payload)?;
        Ok(self.erase_branch_at(index))
    }

    /// Moves the branch of `node` under `new_parent`.
    pub fn reparent(&mut self, node: &T, new_parent: &T) -> Result<NodeIndex> {
        let n = self.require(node)?;
        let p = self.require(new_parent)?;
        if self.branch_range(n).contains(&p.0) {
            return Err(SinewError::CyclicReparent {
                node: format!("{node:?}"),
                parent: format!("{new_parent:?}"),
            });
        }
        Ok(self.reparent_at(n, p))
    }

    /// Turns the branch of `node` into an independent tree.
    pub fn unparent(&mut self, node: &T) -> Result<NodeIndex> {
        let n = self.require(node)?;
        Ok(self.unparent_at(n))
    }
}

// ============================================================================
// Iterators
// ============================================================================

/// Iterator over the direct children of a node.
pub struct Children<'a, T> {
    nodes: &'a [TreeNode<T>],
    next: usize,
    remaining: usize,
}

impl<T> Iterator for Children<'_, T> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next;
        self.next += self.nodes[current].branch_stride;
        self.remaining -= 1;
        Some(NodeIndex(current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Children<'_, T> {}

/// Iterator over the roots of a forest.
pub struct Roots<'a, T> {
    nodes: &'a [TreeNode<T>],
    next: usize,
}

impl<T> Iterator for Roots<'_, T> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let current = self.next;
        let node = self.nodes.get(current)?;
        self.next += node.branch_stride;
        Some(NodeIndex(current))
    }
}
