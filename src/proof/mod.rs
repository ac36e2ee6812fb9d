//! Merkle proofs over a tree
//!
//! A single proof lists sibling digests **leaf-to-root**: `witnesses[0]` is
//! the sibling of the target and the last entry is a child of the root. To
//! recompute the root, start from `leaf` and at each step hash the running
//! value on the left when the current gindex is even (a left child), on the
//! right otherwise, then move to the parent.
//!
//! A multiproof covers several targets with one deduplicated witness set;
//! see [`MultiProof`].

mod multi;

pub use multi::{prove_multi, MultiProof, Witness};

use crate::hasher::Hasher;
use crate::model::{Gindex, Hash};
use crate::trie::NodeRef;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Proof that the node at `gindex` has root digest `leaf`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleProof {
    pub gindex: Gindex,
    pub leaf: Hash,
    /// Sibling digests, leaf-to-root
    pub witnesses: Vec<Hash>,
}

impl SingleProof {
    /// Gindices of the witnesses, in the same order as `witnesses`
    pub fn witness_gindices(&self) -> Vec<Gindex> {
        let mut out = Vec::with_capacity(self.witnesses.len());
        let mut current = self.gindex;
        while let (Some(sibling), Some(parent)) = (current.sibling(), current.parent()) {
            out.push(sibling);
            current = parent;
        }
        out
    }
}

/// Collect the siblings along the path from `root` to `gindex`
pub fn prove_single<H: Hasher>(root: &NodeRef<H>, gindex: Gindex) -> Result<SingleProof> {
    let mut witnesses = Vec::with_capacity(gindex.depth());
    let mut node = root;
    for (level, right) in gindex.path().enumerate() {
        let (left_child, right_child) = node.children().ok_or_else(|| {
            Error::Navigation(format!(
                "reached a leaf at depth {} on the way to gindex {}",
                level, gindex
            ))
        })?;
        if right {
            witnesses.push(left_child.root());
            node = right_child;
        } else {
            witnesses.push(right_child.root());
            node = left_child;
        }
    }
    witnesses.reverse();

    Ok(SingleProof {
        gindex,
        leaf: node.root(),
        witnesses,
    })
}
