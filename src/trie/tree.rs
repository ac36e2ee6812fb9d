//! The tree handle: navigation and single-node edits

use super::batch;
use super::{subtree, Node, NodeRef};
use crate::hasher::{Hasher, KeccakHasher};
use crate::model::{Gindex, Hash};
use crate::proof::{self, MultiProof, SingleProof};
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;

/// A persistent Merkle tree
///
/// A `Tree` is one reference to a root node. Cloning copies that reference
/// only. Every edit returns a new `Tree` that shares all untouched subtrees
/// with `self`, so old versions stay valid for as long as they are held.
pub struct Tree<H: Hasher = KeccakHasher> {
    root: NodeRef<H>,
}

impl<H: Hasher> Clone for Tree<H> {
    fn clone(&self) -> Self {
        Tree {
            root: self.root.clone(),
        }
    }
}

impl<H: Hasher> Tree<H> {
    /// Wrap an existing root node
    pub fn new(root: NodeRef<H>) -> Self {
        Tree { root }
    }

    /// A tree of height `depth` whose leaves are all zero chunks
    pub fn zero(depth: usize) -> Result<Self> {
        Ok(Tree::new(super::zero_node(depth)?))
    }

    /// A tree of height `depth` over `leaves`, zero-padded on the right
    pub fn from_contents(leaves: &[NodeRef<H>], depth: usize) -> Result<Self> {
        Ok(Tree::new(subtree::subtree_fill_to_contents(leaves, depth)?))
    }

    /// The root node
    pub fn root_node(&self) -> &NodeRef<H> {
        &self.root
    }

    /// Replace the root node of this handle
    pub fn set_root(&mut self, root: NodeRef<H>) {
        self.root = root;
    }

    /// The root digest
    pub fn root(&self) -> Hash {
        self.root.root()
    }

    /// Same as [`Tree::root`]
    pub fn hash_tree_root(&self) -> Hash {
        self.root()
    }

    /// Whether both handles point at the very same root node
    pub fn shares_root_with(&self, other: &Tree<H>) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// The node at `gindex`
    pub fn get_node(&self, gindex: Gindex) -> Result<NodeRef<H>> {
        get_node(&self.root, gindex)
    }

    /// The `index`-th node of the row at `depth`
    pub fn get_node_at_depth(&self, depth: usize, index: u64) -> Result<NodeRef<H>> {
        get_node_at_depth(&self.root, depth, index)
    }

    /// A new tree with the node at `gindex` replaced by `node`
    pub fn set_node(&self, gindex: Gindex, node: NodeRef<H>) -> Result<Self> {
        Ok(Tree::new(set_node(&self.root, gindex, node)?))
    }

    /// A new tree with the `index`-th node at `depth` replaced by `node`
    pub fn set_node_at_depth(&self, depth: usize, index: u64, node: NodeRef<H>) -> Result<Self> {
        self.set_node(Gindex::from_index_at_depth(depth, index)?, node)
    }

    /// Nodes at `gindices`, in input order
    pub fn get_nodes(&self, gindices: &[Gindex]) -> Result<Vec<NodeRef<H>>> {
        batch::get_nodes(&self.root, gindices)
    }

    /// `count` consecutive nodes of the row at `depth`, starting at `start`
    pub fn get_nodes_at_depth(
        &self,
        depth: usize,
        start: u64,
        count: u64,
    ) -> Result<Vec<NodeRef<H>>> {
        batch::get_nodes_at_depth(&self.root, depth, start, count)
    }

    /// A new tree with every `gindices[i]` replaced by `nodes[i]`
    pub fn set_nodes(&self, gindices: &[Gindex], nodes: &[NodeRef<H>]) -> Result<Self> {
        Ok(Tree::new(batch::set_nodes(&self.root, gindices, nodes)?))
    }

    /// A new tree with every `indices[i]` of the row at `depth` replaced by `nodes[i]`
    pub fn set_nodes_at_depth(
        &self,
        depth: usize,
        indices: &[u64],
        nodes: &[NodeRef<H>],
    ) -> Result<Self> {
        Ok(Tree::new(batch::set_nodes_at_depth(
            &self.root, depth, indices, nodes,
        )?))
    }

    /// A new tree where every position after `index` at `depth` is zeroed
    pub fn zero_after_index(&self, depth: usize, index: u64) -> Result<Self> {
        Ok(Tree::new(subtree::tree_zero_after_index(
            &self.root, depth, index,
        )?))
    }

    /// Sibling digests needed to recompute the root from the node at `gindex`
    pub fn prove_single(&self, gindex: Gindex) -> Result<SingleProof> {
        proof::prove_single(&self.root, gindex)
    }

    /// One deduplicated proof covering every node in `gindices`
    pub fn prove_multi(&self, gindices: &[Gindex]) -> Result<MultiProof> {
        proof::prove_multi(&self.root, gindices)
    }
}

impl<H: Hasher> fmt::Debug for Tree<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree").field("root", &self.root).finish()
    }
}

/// Walk from `root` to `gindex`
pub fn get_node<H: Hasher>(root: &NodeRef<H>, gindex: Gindex) -> Result<NodeRef<H>> {
    let mut node = root;
    for (level, right) in gindex.path().enumerate() {
        let (left_child, right_child) = node.children().ok_or_else(|| {
            Error::Navigation(format!(
                "reached a leaf at depth {} on the way to gindex {}",
                level, gindex
            ))
        })?;
        node = if right { right_child } else { left_child };
    }
    Ok(node.clone())
}

/// Walk from `root` to the `index`-th node at `depth`
pub fn get_node_at_depth<H: Hasher>(
    root: &NodeRef<H>,
    depth: usize,
    index: u64,
) -> Result<NodeRef<H>> {
    get_node(root, Gindex::from_index_at_depth(depth, index)?)
}

/// Rebuild the path from `root` to `gindex` with `node` at its end
///
/// Only the branches on the path are reallocated; each keeps its off-path
/// child as-is.
pub fn set_node<H: Hasher>(
    root: &NodeRef<H>,
    gindex: Gindex,
    node: NodeRef<H>,
) -> Result<NodeRef<H>> {
    let depth = gindex.depth();
    // Off-path sibling at each level, and whether the path went right
    let mut siblings: Vec<(&NodeRef<H>, bool)> = Vec::with_capacity(depth);

    let mut current = root;
    for (level, right) in gindex.path().enumerate() {
        let (left_child, right_child) = current.children().ok_or_else(|| {
            Error::Navigation(format!(
                "reached a leaf at depth {} on the way to gindex {}",
                level, gindex
            ))
        })?;
        if right {
            siblings.push((left_child, true));
            current = right_child;
        } else {
            siblings.push((right_child, false));
            current = left_child;
        }
    }

    let mut new_node = node;
    for (sibling, right) in siblings.into_iter().rev() {
        new_node = if right {
            Node::branch(sibling.clone(), new_node)
        } else {
            Node::branch(new_node, sibling.clone())
        };
    }
    Ok(new_node)
}
