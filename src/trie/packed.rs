//! Packed bytes ⇄ consecutive leaves
//!
//! A byte buffer maps onto leaves 32 bytes at a time, i.e. eight
//! little-endian `u32` words per leaf. A trailing partial chunk is
//! zero-padded on the way in and truncated on the way out, so
//! `leaves_to_bytes(bytes_to_leaves(b))` gives back `b` for any length.

use super::batch::get_nodes_at_depth;
use super::subtree::subtree_fill_to_contents;
use super::{Node, NodeRef};
use crate::hasher::Hasher;
use crate::model::{Hash, BYTES_PER_CHUNK};
use crate::{Error, Result};

/// Number of leaves needed to hold `size` bytes
pub fn chunk_count(size: usize) -> usize {
    size.div_ceil(BYTES_PER_CHUNK)
}

/// One leaf per 32 bytes of `data`, the last one zero-padded
pub fn bytes_to_leaves<H: Hasher>(data: &[u8]) -> Vec<NodeRef<H>> {
    data.chunks(BYTES_PER_CHUNK)
        .map(|chunk| {
            let mut leaf = Hash::ZERO;
            leaf.as_mut_bytes()[..chunk.len()].copy_from_slice(chunk);
            Node::leaf(leaf)
        })
        .collect()
}

/// Write the chunks of `leaves` into `out`, truncating the last one to fit
///
/// `leaves` must hold exactly `chunk_count(out.len())` nodes.
pub fn leaves_to_bytes<H: Hasher>(out: &mut [u8], leaves: &[NodeRef<H>]) -> Result<()> {
    let needed = chunk_count(out.len());
    if leaves.len() != needed {
        return Err(Error::MismatchedLengths {
            left: needed,
            right: leaves.len(),
        });
    }
    for (dst, leaf) in out.chunks_mut(BYTES_PER_CHUNK).zip(leaves) {
        let root = leaf.root();
        dst.copy_from_slice(&root.as_bytes()[..dst.len()]);
    }
    Ok(())
}

/// Pack `data` into leaves and build a subtree of height `depth` over them
pub fn packed_bytes_to_node<H: Hasher>(depth: usize, data: &[u8]) -> Result<NodeRef<H>> {
    subtree_fill_to_contents(&bytes_to_leaves::<H>(data), depth)
}

/// Read `size` packed bytes back from the leftmost leaves of the row at `depth`
pub fn node_to_packed_bytes<H: Hasher>(
    root: &NodeRef<H>,
    depth: usize,
    size: usize,
) -> Result<Vec<u8>> {
    let leaves = get_nodes_at_depth(root, depth, 0, chunk_count(size) as u64)?;
    let mut out = vec![0u8; size];
    leaves_to_bytes(&mut out, &leaves)?;
    Ok(out)
}
