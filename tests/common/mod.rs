//! Helpers shared by the integration tests

#![allow(dead_code)]

use persistent_merkle::{Hash, Hasher, MultiProof, Node, NodeRef, SingleProof};
use std::collections::BTreeMap;

/// Distinct leaf for every index
pub fn leaf<H: Hasher>(i: u64) -> NodeRef<H> {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&i.to_le_bytes());
    bytes[31] = 0xaa;
    Node::leaf(Hash::from_bytes(bytes))
}

pub fn leaves<H: Hasher>(n: u64) -> Vec<NodeRef<H>> {
    (0..n).map(leaf::<H>).collect()
}

/// Recompute a root from a single proof
pub fn fold_single<H: Hasher>(proof: &SingleProof) -> Hash {
    let mut acc = proof.leaf;
    let mut gindex = proof.gindex;
    for witness in &proof.witnesses {
        acc = if gindex.is_left() {
            H::digest_pair(&acc, witness)
        } else {
            H::digest_pair(witness, &acc)
        };
        gindex = gindex.parent().expect("witness above the root");
    }
    acc
}

/// Recompute a root from a multiproof
pub fn fold_multi<H: Hasher>(proof: &MultiProof) -> Hash {
    let mut known: BTreeMap<u128, Hash> = BTreeMap::new();
    for (gindex, leaf) in proof.gindices.iter().zip(&proof.leaves) {
        known.insert(gindex.value(), *leaf);
    }
    for witness in &proof.witnesses {
        known.insert(witness.gindex.value(), witness.hash);
    }
    while !known.contains_key(&1) {
        let (&deepest, _) = known.iter().next_back().expect("empty proof");
        let (l, r) = (deepest & !1, deepest | 1);
        let parent = H::digest_pair(&known[&l], &known[&r]);
        // Nested targets: the parent may already be known
        known.remove(&l);
        known.remove(&r);
        known.entry(deepest >> 1).or_insert(parent);
    }
    known[&1]
}
