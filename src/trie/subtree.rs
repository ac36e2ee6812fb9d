//! Building balanced subtrees
//!
//! Every builder pads on the right with shared zero subtrees, so two trees
//! over the same leaves and depth are node-for-node identical in digest.

use super::batch::MAX_INDEX_DEPTH;
use super::zero::zero;
use super::{Node, NodeRef};
use crate::hasher::Hasher;
use crate::model::MAX_DEPTH;
use crate::{Error, Result};

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::InvalidDepth {
            depth,
            max: MAX_DEPTH,
        });
    }
    Ok(())
}

fn check_capacity(count: u128, depth: usize) -> Result<()> {
    check_depth(depth)?;
    if count > 1u128 << depth {
        return Err(Error::TooManyNodes {
            count: u64::try_from(count).unwrap_or(u64::MAX),
            depth,
        });
    }
    Ok(())
}

/// A perfect subtree of height `depth` with `bottom` at every position
///
/// Each level is `Branch(x, x)` over the level below, so the result holds
/// `depth` branches no matter how many positions it covers. `depth` is
/// capped at [`MAX_DEPTH`].
pub fn subtree_fill_to_depth<H: Hasher>(
    bottom: &NodeRef<H>,
    depth: usize,
) -> Result<NodeRef<H>> {
    check_depth(depth)?;
    let mut node = bottom.clone();
    for _ in 0..depth {
        node = Node::branch(node.clone(), node);
    }
    Ok(node)
}

/// The first `length` of `2^depth` positions hold `bottom`, the rest are zero
///
/// `length == 0` gives the zero subtree.
pub fn subtree_fill_to_length<H: Hasher>(
    bottom: &NodeRef<H>,
    depth: usize,
    length: u64,
) -> Result<NodeRef<H>> {
    check_capacity(length as u128, depth)?;

    // filled[d] is the full subtree of height d; the chain shares itself
    let mut filled = Vec::with_capacity(depth + 1);
    filled.push(bottom.clone());
    for d in 1..=depth {
        let below = filled[d - 1].clone();
        filled.push(Node::branch(below.clone(), below));
    }
    Ok(fill_to_length(&filled, depth, length as u128))
}

fn fill_to_length<H: Hasher>(filled: &[NodeRef<H>], depth: usize, length: u128) -> NodeRef<H> {
    let max = 1u128 << depth;
    if length == 0 {
        return zero(depth);
    }
    if length == max {
        return filled[depth].clone();
    }

    // 0 < length < max, so depth >= 1
    let pivot = max >> 1;
    if length <= pivot {
        Node::branch(fill_to_length(filled, depth - 1, length), zero(depth - 1))
    } else {
        Node::branch(
            filled[depth - 1].clone(),
            fill_to_length(filled, depth - 1, length - pivot),
        )
    }
}

/// `nodes` placed at the first positions of a subtree of height `depth`,
/// the remaining positions zero
pub fn subtree_fill_to_contents<H: Hasher>(
    nodes: &[NodeRef<H>],
    depth: usize,
) -> Result<NodeRef<H>> {
    check_capacity(nodes.len() as u128, depth)?;
    Ok(fill_to_contents(nodes, depth))
}

fn fill_to_contents<H: Hasher>(nodes: &[NodeRef<H>], depth: usize) -> NodeRef<H> {
    match nodes {
        [] => return zero(depth),
        [only] if depth == 0 => return only.clone(),
        _ => {}
    }

    let pivot = 1u128 << (depth - 1);
    if nodes.len() as u128 <= pivot {
        Node::branch(fill_to_contents(nodes, depth - 1), zero(depth - 1))
    } else {
        // pivot < nodes.len(), so it fits in usize
        let (left, right) = nodes.split_at(pivot as usize);
        Node::branch(
            fill_to_contents(left, depth - 1),
            fill_to_contents(right, depth - 1),
        )
    }
}

/// Zero every position after `index` in the row at `depth`
///
/// The node at `index` and everything before it are kept (shared). Used to
/// truncate a list without touching its surviving elements.
pub fn tree_zero_after_index<H: Hasher>(
    root: &NodeRef<H>,
    depth: usize,
    index: u64,
) -> Result<NodeRef<H>> {
    if depth > MAX_INDEX_DEPTH {
        return Err(Error::InvalidDepth {
            depth,
            max: MAX_INDEX_DEPTH,
        });
    }
    if depth < MAX_INDEX_DEPTH && index >> depth != 0 {
        return Err(Error::InvalidGindex(format!(
            "index {} does not fit at depth {}",
            index, depth
        )));
    }

    // Kept left sibling (if the path went right) per level, top first
    let mut kept: Vec<Option<&NodeRef<H>>> = Vec::with_capacity(depth);
    let mut node = root;
    for level in 0..depth {
        let (left, right) = node.children().ok_or_else(|| {
            Error::Navigation(format!(
                "reached a leaf at depth {} on the way to index {}",
                level, index
            ))
        })?;
        let bit = depth - 1 - level;
        if (index >> bit) & 1 == 1 {
            kept.push(Some(left));
            node = right;
        } else {
            kept.push(None);
            node = left;
        }
    }

    let mut new_node = node.clone();
    for (level, sibling) in kept.into_iter().enumerate().rev() {
        let below = depth - 1 - level;
        new_node = match sibling {
            Some(left) => Node::branch(left.clone(), new_node),
            None => Node::branch(new_node, zero(below)),
        };
    }
    Ok(new_node)
}
