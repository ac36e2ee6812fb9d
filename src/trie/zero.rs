//! Canonical all-zero subtrees
//!
//! Sparse and padded regions of a tree point at the same zero nodes, so a
//! list of capacity `2^40` holding three elements costs three leaves plus
//! about forty branches. The cache is filled lazily, once per hasher, and a
//! node never leaves it once inserted.

use super::{Node, NodeRef};
use crate::hasher::Hasher;
use crate::model::{Hash, MAX_DEPTH};
use crate::{Error, Result};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::BTreeMap;

type CacheRef = &'static (dyn Any + Send + Sync);

/// Caches of hashers that do not provide their own
static REGISTRY: RwLock<BTreeMap<TypeId, CacheRef>> =
    parking_lot::const_rwlock(BTreeMap::new());

/// Zero subtrees indexed by depth. One static instance per [`Hasher`].
pub struct ZeroCache<H: Hasher> {
    nodes: RwLock<Vec<NodeRef<H>>>,
}

impl<H: Hasher> ZeroCache<H> {
    pub const fn new() -> Self {
        ZeroCache {
            nodes: parking_lot::const_rwlock(Vec::new()),
        }
    }

    /// Number of depths populated so far
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    fn get_or_fill(&self, depth: usize) -> NodeRef<H> {
        if let Some(node) = self.nodes.read().get(depth) {
            return node.clone();
        }

        let mut nodes = self.nodes.write();
        // Another thread may have filled it between the two locks
        if nodes.is_empty() {
            nodes.push(Node::leaf(Hash::ZERO));
        }
        while nodes.len() <= depth {
            let below = nodes[nodes.len() - 1].clone();
            nodes.push(Node::branch(below.clone(), below));
        }
        nodes[depth].clone()
    }
}

impl<H: Hasher> Default for ZeroCache<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// The cache for `H`, created on first use and never freed
pub(crate) fn registered_zero_cache<H: Hasher>() -> &'static ZeroCache<H> {
    let id = TypeId::of::<ZeroCache<H>>();
    let found = REGISTRY.read().get(&id).copied();
    if let Some(cache) = found.and_then(|c| c.downcast_ref::<ZeroCache<H>>()) {
        return cache;
    }

    let mut registry = REGISTRY.write();
    // Another thread may have registered it between the two locks
    if let Some(cache) = registry
        .get(&id)
        .copied()
        .and_then(|c| c.downcast_ref::<ZeroCache<H>>())
    {
        return cache;
    }
    let cache: &'static ZeroCache<H> = Box::leak(Box::new(ZeroCache::new()));
    registry.insert(id, cache);
    cache
}

/// The shared all-zero subtree of height `depth`
pub fn zero_node<H: Hasher>(depth: usize) -> Result<NodeRef<H>> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(zero::<H>(depth))
}

/// Root digest of the all-zero subtree of height `depth`
pub fn zero_hash<H: Hasher>(depth: usize) -> Result<Hash> {
    Ok(zero_node::<H>(depth)?.root())
}

/// Unchecked variant for callers that already validated `depth`
pub(crate) fn zero<H: Hasher>(depth: usize) -> NodeRef<H> {
    H::zero_cache().get_or_fill(depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::{Blake3Hasher, KeccakHasher};
    use std::sync::Arc;

    #[test]
    fn test_zero_leaf() {
        let z = zero_node::<KeccakHasher>(0).unwrap();
        assert!(z.is_leaf());
        assert_eq!(z.root(), Hash::ZERO);
    }

    #[test]
    fn test_same_instance_across_calls() {
        let a = zero_node::<KeccakHasher>(10).unwrap();
        let b = zero_node::<KeccakHasher>(10).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.root(), b.root());
    }

    #[test]
    fn test_children_are_shared_zero_nodes() {
        let z5 = zero_node::<KeccakHasher>(5).unwrap();
        let z4 = zero_node::<KeccakHasher>(4).unwrap();
        let (left, right) = z5.children().unwrap();
        assert!(Arc::ptr_eq(left, &z4));
        assert!(Arc::ptr_eq(right, &z4));
    }

    #[test]
    fn test_known_zero_hashes() {
        assert_eq!(
            zero_hash::<KeccakHasher>(1).unwrap().to_hex(),
            "ad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );
        assert_eq!(
            zero_hash::<KeccakHasher>(2).unwrap().to_hex(),
            "b4c11951957c6f8f642c4af61cd6b24640fec6dc7fc607ee8206a99e92410d30"
        );
    }

    #[test]
    fn test_zero_recurrence() {
        for d in 1..60 {
            let expected = KeccakHasher::digest_pair(
                &zero_hash::<KeccakHasher>(d - 1).unwrap(),
                &zero_hash::<KeccakHasher>(d - 1).unwrap(),
            );
            assert_eq!(zero_hash::<KeccakHasher>(d).unwrap(), expected);
        }
    }

    #[test]
    fn test_caches_are_per_hasher() {
        assert_ne!(
            zero_hash::<KeccakHasher>(3).unwrap(),
            zero_hash::<Blake3Hasher>(3).unwrap()
        );
    }

    #[test]
    fn test_depth_limit() {
        assert!(zero_node::<KeccakHasher>(MAX_DEPTH).is_ok());
        assert_eq!(
            zero_node::<KeccakHasher>(MAX_DEPTH + 1).unwrap_err(),
            Error::InvalidDepth {
                depth: MAX_DEPTH + 1,
                max: MAX_DEPTH
            }
        );
    }

    /// Relies on the registry rather than declaring its own cache
    struct AddHasher;

    impl Hasher for AddHasher {
        const NAME: &'static str = "add";

        fn digest_pair(left: &Hash, right: &Hash) -> Hash {
            let mut out = [0u8; 32];
            for (i, byte) in out.iter_mut().enumerate() {
                *byte = left.as_bytes()[i]
                    .wrapping_add(right.as_bytes()[i])
                    .wrapping_add(1);
            }
            Hash::from_bytes(out)
        }
    }

    #[test]
    fn test_registered_cache_for_custom_hasher() {
        let a = zero_node::<AddHasher>(6).unwrap();
        let b = zero_node::<AddHasher>(6).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(std::ptr::eq(
            AddHasher::zero_cache(),
            registered_zero_cache::<AddHasher>()
        ));

        assert_eq!(zero_hash::<AddHasher>(1).unwrap(), Hash::repeat(1));
        for d in 1..20 {
            let below = zero_hash::<AddHasher>(d - 1).unwrap();
            assert_eq!(
                zero_hash::<AddHasher>(d).unwrap(),
                AddHasher::digest_pair(&below, &below)
            );
        }
        assert_ne!(
            zero_hash::<AddHasher>(4).unwrap(),
            zero_hash::<KeccakHasher>(4).unwrap()
        );
    }

    #[test]
    fn test_concurrent_first_use() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| zero_node::<Blake3Hasher>(40).unwrap()))
            .collect();
        let nodes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for node in &nodes[1..] {
            assert!(Arc::ptr_eq(node, &nodes[0]));
        }
    }
}
