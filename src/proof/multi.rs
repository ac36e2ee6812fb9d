//! Multiproofs: one witness set for many targets

use crate::hasher::Hasher;
use crate::model::{Gindex, Hash, MAX_DEPTH};
use crate::trie::NodeRef;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};

const LOG_TARGET: &str = "persistent_merkle::proof::multi";

/// A digest the verifier cannot derive from the targets, with its position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness {
    pub gindex: Gindex,
    pub hash: Hash,
}

/// Proof for several nodes at once
///
/// `gindices` are the distinct targets in depth-first order (ancestors first,
/// then left before right) and `leaves` their digests in the same order.
/// `witnesses` are the roots of every maximal subtree holding no target,
/// in depth-first, left-to-right order. A sibling shared by several targets
/// appears once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiProof {
    pub gindices: Vec<Gindex>,
    pub leaves: Vec<Hash>,
    pub witnesses: Vec<Witness>,
}

struct Target {
    key: u128,
    gindex: Gindex,
}

/// Build a multiproof for `gindices` (order and duplicates do not matter)
///
/// With no targets at all the proof is the root itself as the one witness.
pub fn prove_multi<H: Hasher>(root: &NodeRef<H>, gindices: &[Gindex]) -> Result<MultiProof> {
    let mut targets: Vec<Target> = gindices
        .iter()
        .map(|&gindex| Target {
            key: gindex.aligned(),
            gindex,
        })
        .collect();
    targets.sort_by_key(|t| (t.key, t.gindex.depth()));
    targets.dedup_by_key(|t| t.gindex);

    let mut proof = MultiProof {
        gindices: targets.iter().map(|t| t.gindex).collect(),
        leaves: Vec::with_capacity(targets.len()),
        witnesses: Vec::new(),
    };
    descend(root, Gindex::ROOT, &targets, &mut proof)?;

    debug!(
        target: LOG_TARGET,
        "Multiproof for {} target(s) needs {} witness(es)",
        proof.gindices.len(),
        proof.witnesses.len()
    );
    Ok(proof)
}

fn descend<H: Hasher>(
    node: &NodeRef<H>,
    gindex: Gindex,
    targets: &[Target],
    proof: &mut MultiProof,
) -> Result<()> {
    if targets.is_empty() {
        proof.witnesses.push(Witness {
            gindex,
            hash: node.root(),
        });
        return Ok(());
    }

    let level = gindex.depth();
    let below = match targets.first() {
        Some(first) if first.gindex == gindex => {
            proof.leaves.push(node.root());
            &targets[1..]
        }
        _ => targets,
    };
    if below.is_empty() {
        return Ok(());
    }

    let (left, right) = node.children().ok_or_else(|| {
        Error::Navigation(format!(
            "reached a leaf at gindex {} with {} target(s) still below it",
            gindex,
            below.len()
        ))
    })?;
    let bit = MAX_DEPTH - 1 - level;
    let split = below.partition_point(|t| (t.key >> bit) & 1 == 0);
    descend(left, gindex.left()?, &below[..split], proof)?;
    descend(right, gindex.right()?, &below[split..], proof)
}
