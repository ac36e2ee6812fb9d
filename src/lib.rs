//! # persistent_merkle
//!
//! A persistent, structurally-shared binary Merkle tree.
//!
//! Values of a schema-based serialization format are merkleized into 32-byte
//! chunks and folded pairwise into a single root. This crate is the tree
//! underneath: it keeps those chunks in immutable nodes, shares every
//! unchanged subtree between versions, and answers reads, bulk edits and
//! proofs by generalized index.
//!
//! ## Core Concepts
//!
//! - **Node**: an immutable leaf (one chunk) or branch (two shared children)
//!   with a lazily computed, memoized root digest
//! - **Gindex**: a root-to-node path packed into an integer, `1` being the root
//! - **Tree**: a cheap-to-clone handle on a root; edits return new trees
//! - **Zero subtrees**: one canonical all-zero node per depth, shared by all
//!   padded regions
//! - **Proofs**: sibling digests for one target, or a deduplicated set for many
//!
//! The reference hasher is Keccak-256 over the 64-byte concatenation of two
//! children ([`KeccakHasher`]). Trees are generic over [`Hasher`].
//!
//! ## Example
//!
//! ```
//! use persistent_merkle::{Gindex, Hash, Node, Tree};
//!
//! let leaves: Vec<_> = (1..=5u8).map(|b| Node::leaf(Hash::repeat(b))).collect();
//! let tree: Tree = Tree::from_contents(&leaves, 3)?;
//!
//! let zeros = [Node::leaf(Hash::ZERO), Node::leaf(Hash::ZERO)];
//! let edited = tree.set_nodes_at_depth(3, &[0, 4], &zeros)?;
//! assert_ne!(edited.root(), tree.root());
//!
//! let proof = edited.prove_single(Gindex::from_index_at_depth(3, 4)?)?;
//! assert_eq!(proof.witnesses.len(), 3);
//! # Ok::<(), persistent_merkle::Error>(())
//! ```

pub mod hasher;
pub mod model;
pub mod proof;
pub mod trie;

mod error;

pub use error::{Error, Result};
pub use hasher::{digest_two, Blake3Hasher, Hasher, KeccakHasher};
pub use model::{Gindex, Hash, BYTES_PER_CHUNK, MAX_DEPTH};
pub use proof::{prove_multi, prove_single, MultiProof, SingleProof, Witness};
pub use trie::{
    bytes_to_leaves, get_node, get_node_at_depth, get_nodes, get_nodes_at_depth,
    iterate_nodes_at_depth, leaves_to_bytes, node_to_packed_bytes, packed_bytes_to_node, set_node,
    set_nodes, set_nodes_at_depth, subtree_fill_to_contents, subtree_fill_to_depth,
    subtree_fill_to_length, tree_zero_after_index, zero_hash, zero_node, Node, NodeRef, Tree,
};
