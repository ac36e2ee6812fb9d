//! Tree node types

use crate::hasher::{Hasher, KeccakHasher};
use crate::model::{Hash, BYTES_PER_CHUNK};
use crate::{Error, Result};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

/// Shared handle to an immutable node. Identity is `Arc::ptr_eq`.
pub type NodeRef<H = KeccakHasher> = Arc<Node<H>>;

/// Number of 32-bit words in a leaf
pub const WORDS_PER_LEAF: usize = 8;

/// An immutable node of the tree
///
/// Nodes never change after construction; an edit always builds new nodes
/// and shares every untouched subtree with the previous version.
pub enum Node<H: Hasher = KeccakHasher> {
    /// A 32-byte chunk. Its root is the chunk itself.
    Leaf(Hash),
    /// Two children, with the combined digest computed on first use
    Branch(Branch<H>),
}

/// An internal node. The root digest is computed once and then memoized.
pub struct Branch<H: Hasher> {
    left: NodeRef<H>,
    right: NodeRef<H>,
    root: OnceLock<Hash>,
    _hasher: PhantomData<fn() -> H>,
}

impl<H: Hasher> Branch<H> {
    pub fn left(&self) -> &NodeRef<H> {
        &self.left
    }

    pub fn right(&self) -> &NodeRef<H> {
        &self.right
    }

    fn root(&self) -> Hash {
        *self
            .root
            .get_or_init(|| H::digest_pair(&self.left.root(), &self.right.root()))
    }

    /// Whether the digest has been computed already
    pub fn is_hashed(&self) -> bool {
        self.root.get().is_some()
    }
}

impl<H: Hasher> Node<H> {
    /// Create a shared leaf
    pub fn leaf(chunk: Hash) -> NodeRef<H> {
        Arc::new(Node::Leaf(chunk))
    }

    /// Create a shared leaf from exactly 32 bytes
    pub fn leaf_from_slice(bytes: &[u8]) -> Result<NodeRef<H>> {
        Ok(Node::leaf(Hash::from_slice(bytes)?))
    }

    /// Create a shared leaf from eight words, each stored little-endian
    pub fn leaf_from_words(words: [u32; WORDS_PER_LEAF]) -> NodeRef<H> {
        let mut chunk = Hash::ZERO;
        for (dst, word) in chunk.as_mut_bytes().chunks_exact_mut(4).zip(words) {
            dst.copy_from_slice(&word.to_le_bytes());
        }
        Node::leaf(chunk)
    }

    /// Create a shared branch over two existing subtrees
    pub fn branch(left: NodeRef<H>, right: NodeRef<H>) -> NodeRef<H> {
        Arc::new(Node::Branch(Branch {
            left,
            right,
            root: OnceLock::new(),
            _hasher: PhantomData,
        }))
    }

    /// The root digest: the chunk for a leaf, `H(left, right)` for a branch
    pub fn root(&self) -> Hash {
        match self {
            Node::Leaf(chunk) => *chunk,
            Node::Branch(branch) => branch.root(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Left and right children, or `None` for a leaf
    pub fn children(&self) -> Option<(&NodeRef<H>, &NodeRef<H>)> {
        match self {
            Node::Leaf(_) => None,
            Node::Branch(branch) => Some((&branch.left, &branch.right)),
        }
    }

    /// The eight little-endian words of this node's root
    pub fn words(&self) -> [u32; WORDS_PER_LEAF] {
        let root = self.root();
        let mut words = [0u32; WORDS_PER_LEAF];
        for (word, src) in words.iter_mut().zip(root.as_bytes().chunks_exact(4)) {
            *word = u32::from_le_bytes([src[0], src[1], src[2], src[3]]);
        }
        words
    }

    /// The `i`-th word of this node's root
    pub fn word(&self, i: usize) -> Result<u32> {
        self.words().get(i).copied().ok_or_else(|| {
            Error::InvalidPacking(format!("word {} out of {}", i, WORDS_PER_LEAF))
        })
    }

    /// Read the `index`-th unsigned integer of `size` bytes packed
    /// little-endian into this node's chunk
    pub fn packed_uint(&self, index: usize, size: usize) -> Result<u64> {
        let offset = packed_offset(index, size)?;
        let root = self.root();
        let mut buf = [0u8; 8];
        buf[..size].copy_from_slice(&root.as_bytes()[offset..offset + size]);
        Ok(u64::from_le_bytes(buf))
    }

    /// A new leaf equal to this node's chunk with the `index`-th `size`-byte
    /// integer replaced by `value`
    pub fn with_packed_uint(&self, index: usize, size: usize, value: u64) -> Result<NodeRef<H>> {
        let offset = packed_offset(index, size)?;
        if size < 8 && value >> (size * 8) != 0 {
            return Err(Error::InvalidPacking(format!(
                "value {} does not fit in {} bytes",
                value, size
            )));
        }
        let mut chunk = self.root();
        chunk.as_mut_bytes()[offset..offset + size]
            .copy_from_slice(&value.to_le_bytes()[..size]);
        Ok(Node::leaf(chunk))
    }
}

fn packed_offset(index: usize, size: usize) -> Result<usize> {
    if !matches!(size, 1 | 2 | 4 | 8) {
        return Err(Error::InvalidPacking(format!(
            "unsupported integer size {}",
            size
        )));
    }
    let per_chunk = BYTES_PER_CHUNK / size;
    if index >= per_chunk {
        return Err(Error::InvalidPacking(format!(
            "index {} out of {} integers of {} bytes",
            index, per_chunk, size
        )));
    }
    Ok(index * size)
}

impl<H: Hasher> fmt::Debug for Node<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf(chunk) => write!(f, "Leaf({})", chunk.short()),
            Node::Branch(branch) => match branch.root.get() {
                Some(root) => write!(f, "Branch({})", root.short()),
                None => write!(f, "Branch(..)"),
            },
        }
    }
}
