//! Persistent binary Merkle tree with structural sharing
//!
//! This implements an immutable binary tree where:
//! - Each branch's digest is derived from its children's digests, once
//! - Edits rebuild only the path they touch; unchanged subtrees are shared
//! - All-zero regions point at one cached zero subtree per depth
//! - The root digest uniquely identifies the leaf contents at a given depth

mod batch;
mod node;
mod packed;
mod subtree;
mod tree;
mod zero;

pub use batch::{
    get_nodes, get_nodes_at_depth, iterate_nodes_at_depth, set_nodes, set_nodes_at_depth,
    NodesAtDepth, MAX_INDEX_DEPTH,
};
pub use node::{Branch, Node, NodeRef, WORDS_PER_LEAF};
pub use packed::{
    bytes_to_leaves, chunk_count, leaves_to_bytes, node_to_packed_bytes, packed_bytes_to_node,
};
pub use subtree::{
    subtree_fill_to_contents, subtree_fill_to_depth, subtree_fill_to_length, tree_zero_after_index,
};
pub use tree::{get_node, get_node_at_depth, set_node, Tree};
pub use zero::{zero_hash, zero_node, ZeroCache};

pub(crate) use zero::registered_zero_cache;
