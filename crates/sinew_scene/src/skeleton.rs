use glam::Mat4;
use rustc_hash::FxHashMap;
use sinew_core::{CompactTree, NodeIndex, Result, SinewError};

/// Payload of one skeleton slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonNode {
    /// Unique within its skeleton.
    pub name: String,
    /// Bind-pose transform relative to the parent.
    pub local_tfm: Mat4,
    /// Model-space transform, rewritten by every evaluation.
    pub global_tfm: Mat4,
    /// Index into the model's bone table, if this node drives skinning.
    pub bone_index: Option<usize>,
    /// Meshes attached to this node.
    pub nbr_meshes: usize,
}

impl SkeletonNode {
    #[must_use]
    pub fn new(name: impl Into<String>, local_tfm: Mat4) -> Self {
        Self {
            name: name.into(),
            local_tfm,
            global_tfm: local_tfm,
            bone_index: None,
            nbr_meshes: 0,
        }
    }
}

/// Skeleton hierarchy stored in a [`CompactTree`].
///
/// Nodes are addressed by name; a name→index cache is rebuilt after every
/// structural edit. Edits are meant for load time: node indices held elsewhere
/// (bones, clips, meshes) go stale once the layout changes.
#[derive(Debug, Clone, Default)]
pub struct SkeletonGraph {
    tree: CompactTree<SkeletonNode>,
    lookup: FxHashMap<String, NodeIndex>,
}

impl SkeletonGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tree: CompactTree::with_capacity(capacity),
            lookup: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Builds a graph from `(name, parent, local transform)` triples. Parents
    /// must be listed before their children; siblings keep their listed order.
    pub fn build<I>(nodes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, Option<String>, Mat4)>,
    {
        let nodes = nodes.into_iter();
        let mut graph = Self::with_capacity(nodes.size_hint().0);
        for (name, parent, local) in nodes {
            match parent {
                Some(parent) => graph.append(name, &parent, local)?,
                None => graph.insert_root(name, local)?,
            };
        }
        log::debug!(
            "Skeleton graph built: {} nodes, {} roots",
            graph.len(),
            graph.tree.roots().count()
        );
        Ok(graph)
    }

    // ========================================================================
    // Lookup & Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn tree(&self) -> &CompactTree<SkeletonNode> {
        &self.tree
    }

    #[inline]
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeIndex> {
        self.lookup.get(name).copied()
    }

    pub fn require(&self, name: &str) -> Result<NodeIndex> {
        self.find(name)
            .ok_or_else(|| SinewError::NodeNotFound(name.to_owned()))
    }

    #[inline]
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &SkeletonNode {
        self.tree.payload(index)
    }

    #[inline]
    pub fn node_mut(&mut self, index: NodeIndex) -> &mut SkeletonNode {
        self.tree.payload_mut(index)
    }

    #[must_use]
    pub fn node_by_name(&self, name: &str) -> Option<&SkeletonNode> {
        self.find(name).map(|index| self.node(index))
    }

    #[must_use]
    pub fn parent_of(&self, name: &str) -> Option<&SkeletonNode> {
        let index = self.find(name)?;
        self.tree.parent_index(index).map(|p| self.node(p))
    }

    #[must_use]
    pub fn depth_of(&self, name: &str) -> Option<usize> {
        self.find(name).map(|index| self.tree.depth_of(index))
    }

    // ========================================================================
    // Structural Edits
    // ========================================================================

    pub fn insert_root(&mut self, name: impl Into<String>, local: Mat4) -> Result<NodeIndex> {
        let name = self.unique_name(name.into())?;
        let index = self.tree.insert_as_root(SkeletonNode::new(name, local));
        self.rebuild_lookup();
        Ok(index)
    }

    /// Inserts `name` as the first child of `parent`.
    pub fn insert(&mut self, name: impl Into<String>, parent: &str, local: Mat4) -> Result<NodeIndex> {
        let name = self.unique_name(name.into())?;
        let parent = self.require(parent)?;
        let index = self.tree.insert_at(SkeletonNode::new(name, local), parent);
        self.rebuild_lookup();
        Ok(index)
    }

    /// Inserts `name` as the last child of `parent`.
    pub fn append(&mut self, name: impl Into<String>, parent: &str, local: Mat4) -> Result<NodeIndex> {
        let name = self.unique_name(name.into())?;
        let parent = self.require(parent)?;
        let index = self.tree.append_child_at(SkeletonNode::new(name, local), parent);
        self.rebuild_lookup();
        Ok(index)
    }

    /// Removes `name` and its subtree; returns the number of removed nodes.
    pub fn erase(&mut self, name: &str) -> Result<usize> {
        let index = self.require(name)?;
        let removed = self.tree.erase_branch_at(index);
        self.rebuild_lookup();
        Ok(removed)
    }

    pub fn reparent(&mut self, name: &str, new_parent: &str) -> Result<NodeIndex> {
        let node = self.require(name)?;
        let parent = self.require(new_parent)?;
        if self.tree.branch_range(node).contains(&parent.index()) {
            return Err(SinewError::CyclicReparent {
                node: name.to_owned(),
                parent: new_parent.to_owned(),
            });
        }
        let index = self.tree.reparent_at(node, parent);
        self.rebuild_lookup();
        Ok(index)
    }

    pub fn unparent(&mut self, name: &str) -> Result<NodeIndex> {
        let node = self.require(name)?;
        let index = self.tree.unparent_at(node);
        self.rebuild_lookup();
        Ok(index)
    }

    fn unique_name(&self, name: String) -> Result<String> {
        if self.lookup.contains_key(&name) {
            return Err(SinewError::DuplicateNode(name));
        }
        Ok(name)
    }

    fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        self.lookup.reserve(self.tree.len());
        for (index, node) in self.tree.iter() {
            self.lookup.insert(node.payload.name.clone(), index);
        }
    }

    // ========================================================================
    // Transform Propagation
    // ========================================================================

    /// Recomputes every global transform in one forward pass. `local` supplies
    /// the local transform of each node; parents are always resolved first.
    pub fn propagate<F>(&mut self, mut local: F)
    where
        F: FnMut(NodeIndex, &SkeletonNode) -> Mat4,
    {
        self.tree
            .traverse_progressive_all_mut(|node, parent, index, _| {
                let local_tfm = local(index, node);
                node.global_tfm = match parent {
                    Some(parent) => parent.global_tfm * local_tfm,
                    None => local_tfm,
                };
            });
    }

    /// Poses every node with its static local transform.
    pub fn reset_to_bind_pose(&mut self) {
        self.propagate(|_, node| node.local_tfm);
    }

    /// Indented listing of the hierarchy, one node per line.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for root in self.tree.roots() {
            self.tree.traverse_depthfirst_with_level(root, |node, index, level| {
                let bone = node
                    .bone_index
                    .map_or_else(String::new, |b| format!(" [bone {b}]"));
                out.push_str(&format!("{:indent$}{} {index}{bone}\n", "", node.name, indent = level * 2));
            });
        }
        log::debug!("Skeleton hierarchy:\n{out}");
        out
    }
}
