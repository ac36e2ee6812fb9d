//! Batch reads and writes
//!
//! Targets are sorted by path once. The descent then splits the sorted slice
//! at every branch into the part that goes left and the part that goes
//! right, so each branch shared by several targets is visited (and, for
//! writes, rebuilt) exactly once. A side with no targets is returned as-is.
//!
//! Duplicate addresses in a write batch resolve to the last occurrence in
//! input order. When one target is an ancestor of another, the ancestor is
//! replaced first and the deeper target is applied inside the replacement.

use super::{Node, NodeRef};
use crate::hasher::Hasher;
use crate::model::{Gindex, MAX_DEPTH};
use crate::{Error, Result};
use log::{debug, trace};
use std::sync::Arc;

const LOG_TARGET: &str = "persistent_merkle::trie::batch";

/// Deepest row addressable by a `u64` index
pub const MAX_INDEX_DEPTH: usize = 64;

/// A batch entry keyed by its left-aligned path
struct Target<T> {
    key: u128,
    depth: usize,
    item: T,
}

impl<T> Target<T> {
    fn goes_right(&self, level: usize) -> bool {
        (self.key >> (MAX_DEPTH - 1 - level)) & 1 == 1
    }
}

/// Sort into depth-first order. The sort is stable, so equal addresses keep
/// their input order.
fn sorted_targets<T>(gindices: &[Gindex], items: impl IntoIterator<Item = T>) -> Vec<Target<T>> {
    let mut targets: Vec<Target<T>> = gindices
        .iter()
        .zip(items)
        .map(|(g, item)| Target {
            key: g.aligned(),
            depth: g.depth(),
            item,
        })
        .collect();
    targets.sort_by_key(|t| (t.key, t.depth));
    targets
}

fn leaf_reached(level: usize, pending: usize) -> Error {
    Error::Navigation(format!(
        "reached a leaf at depth {} with {} target(s) still below it",
        level, pending
    ))
}

/// Replace every `gindices[i]` with `nodes[i]` in one pass
pub fn set_nodes<H: Hasher>(
    root: &NodeRef<H>,
    gindices: &[Gindex],
    nodes: &[NodeRef<H>],
) -> Result<NodeRef<H>> {
    if gindices.len() != nodes.len() {
        return Err(Error::MismatchedLengths {
            left: gindices.len(),
            right: nodes.len(),
        });
    }
    if gindices.is_empty() {
        return Ok(root.clone());
    }

    let targets = sorted_targets(gindices, nodes);
    debug!(target: LOG_TARGET, "Setting {} node(s) by gindex", targets.len());
    set_sorted(root, &targets, 0)
}

fn set_sorted<H: Hasher>(
    node: &NodeRef<H>,
    targets: &[Target<&NodeRef<H>>],
    level: usize,
) -> Result<NodeRef<H>> {
    if targets.is_empty() {
        return Ok(node.clone());
    }

    // Targets addressing this exact node sort before everything below it
    let here = targets.partition_point(|t| t.depth == level);
    let (exact, below) = targets.split_at(here);
    let base = match exact.last() {
        Some(t) => t.item.clone(),
        None => node.clone(),
    };
    if below.is_empty() {
        return Ok(base);
    }

    let (left, right) = base
        .children()
        .ok_or_else(|| leaf_reached(level, below.len()))?;
    let split = below.partition_point(|t| !t.goes_right(level));
    let new_left = set_sorted(left, &below[..split], level + 1)?;
    let new_right = set_sorted(right, &below[split..], level + 1)?;

    if Arc::ptr_eq(&new_left, left) && Arc::ptr_eq(&new_right, right) {
        return Ok(base);
    }
    Ok(Node::branch(new_left, new_right))
}

/// Replace the `indices[i]`-th node of the row at `depth` with `nodes[i]`
///
/// Same result as [`set_nodes`] with `2^depth + indices[i]`, without any
/// gindex arithmetic per element.
pub fn set_nodes_at_depth<H: Hasher>(
    root: &NodeRef<H>,
    depth: usize,
    indices: &[u64],
    nodes: &[NodeRef<H>],
) -> Result<NodeRef<H>> {
    if indices.len() != nodes.len() {
        return Err(Error::MismatchedLengths {
            left: indices.len(),
            right: nodes.len(),
        });
    }
    check_index_depth(depth)?;
    if indices.is_empty() {
        return Ok(root.clone());
    }

    let mut pairs: Vec<(u64, &NodeRef<H>)> = indices.iter().copied().zip(nodes).collect();
    for &(index, _) in &pairs {
        check_index(depth, index)?;
    }
    pairs.sort_by_key(|&(index, _)| index);
    // Keep the last write for each index
    pairs.dedup_by(|later, kept| {
        if later.0 == kept.0 {
            std::mem::swap(later, kept);
            true
        } else {
            false
        }
    });

    debug!(
        target: LOG_TARGET,
        "Setting {} node(s) at depth {} ({} requested)",
        pairs.len(),
        depth,
        indices.len()
    );
    set_sorted_at_depth(root, &pairs, depth)
}

fn set_sorted_at_depth<H: Hasher>(
    node: &NodeRef<H>,
    pairs: &[(u64, &NodeRef<H>)],
    remaining: usize,
) -> Result<NodeRef<H>> {
    match pairs {
        [] => return Ok(node.clone()),
        [(_, replacement)] if remaining == 0 => return Ok((*replacement).clone()),
        _ => {}
    }

    let (left, right) = node.children().ok_or_else(|| {
        Error::Navigation(format!(
            "reached a leaf {} level(s) above the target row with {} target(s) pending",
            remaining,
            pairs.len()
        ))
    })?;
    let bit = remaining - 1;
    let split = pairs.partition_point(|&(index, _)| (index >> bit) & 1 == 0);
    let new_left = set_sorted_at_depth(left, &pairs[..split], bit)?;
    let new_right = set_sorted_at_depth(right, &pairs[split..], bit)?;

    if Arc::ptr_eq(&new_left, left) && Arc::ptr_eq(&new_right, right) {
        return Ok(node.clone());
    }
    Ok(Node::branch(new_left, new_right))
}

/// Nodes at `gindices`, one per input, in input order
pub fn get_nodes<H: Hasher>(root: &NodeRef<H>, gindices: &[Gindex]) -> Result<Vec<NodeRef<H>>> {
    let targets = sorted_targets(gindices, 0..gindices.len());
    let mut out: Vec<Option<NodeRef<H>>> = vec![None; gindices.len()];
    get_sorted(root, &targets, 0, &mut out)?;

    trace!(target: LOG_TARGET, "Read {} node(s) by gindex", out.len());
    out.into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| Error::Navigation("batch read left a target unresolved".into()))
}

fn get_sorted<H: Hasher>(
    node: &NodeRef<H>,
    targets: &[Target<usize>],
    level: usize,
    out: &mut [Option<NodeRef<H>>],
) -> Result<()> {
    if targets.is_empty() {
        return Ok(());
    }

    let here = targets.partition_point(|t| t.depth == level);
    for t in &targets[..here] {
        out[t.item] = Some(node.clone());
    }
    let below = &targets[here..];
    if below.is_empty() {
        return Ok(());
    }

    let (left, right) = node
        .children()
        .ok_or_else(|| leaf_reached(level, below.len()))?;
    let split = below.partition_point(|t| !t.goes_right(level));
    get_sorted(left, &below[..split], level + 1, out)?;
    get_sorted(right, &below[split..], level + 1, out)
}

/// `count` consecutive nodes of the row at `depth`, starting at `start`
pub fn get_nodes_at_depth<H: Hasher>(
    root: &NodeRef<H>,
    depth: usize,
    start: u64,
    count: u64,
) -> Result<Vec<NodeRef<H>>> {
    iterate_nodes_at_depth(root, depth, start, count)?.collect()
}

/// Lazy version of [`get_nodes_at_depth`]
pub fn iterate_nodes_at_depth<H: Hasher>(
    root: &NodeRef<H>,
    depth: usize,
    start: u64,
    count: u64,
) -> Result<NodesAtDepth<H>> {
    check_index_depth(depth)?;
    let start = start as u128;
    let end = start + count as u128;
    if end > 1u128 << depth {
        return Err(Error::TooManyNodes { count, depth });
    }

    let mut stack = Vec::with_capacity(depth + 1);
    if count > 0 {
        stack.push(Frame {
            node: root.clone(),
            depth,
            start,
            end,
        });
    }
    Ok(NodesAtDepth { stack })
}

struct Frame<H: Hasher> {
    node: NodeRef<H>,
    depth: usize,
    start: u128,
    end: u128,
}

/// Iterator over a contiguous range of one row, left to right
///
/// Each branch above the range is visited once, however many of the
/// requested nodes lie beneath it.
pub struct NodesAtDepth<H: Hasher> {
    stack: Vec<Frame<H>>,
}

impl<H: Hasher> Iterator for NodesAtDepth<H> {
    type Item = Result<NodeRef<H>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Frame {
                node,
                depth,
                start,
                end,
            } = self.stack.pop()?;
            if depth == 0 {
                return Some(Ok(node));
            }

            let Some((left, right)) = node.children() else {
                self.stack.clear();
                return Some(Err(Error::Navigation(format!(
                    "reached a leaf {} level(s) above the requested row",
                    depth
                ))));
            };
            let half = 1u128 << (depth - 1);
            if end > half {
                self.stack.push(Frame {
                    node: right.clone(),
                    depth: depth - 1,
                    start: start.max(half) - half,
                    end: end - half,
                });
            }
            if start < half {
                self.stack.push(Frame {
                    node: left.clone(),
                    depth: depth - 1,
                    start,
                    end: end.min(half),
                });
            }
        }
    }
}

fn check_index_depth(depth: usize) -> Result<()> {
    if depth > MAX_INDEX_DEPTH {
        return Err(Error::InvalidDepth {
            depth,
            max: MAX_INDEX_DEPTH,
        });
    }
    Ok(())
}

fn check_index(depth: usize, index: u64) -> Result<()> {
    if depth < MAX_INDEX_DEPTH && index >> depth != 0 {
        return Err(Error::InvalidGindex(format!(
            "index {} does not fit at depth {}",
            index, depth
        )));
    }
    Ok(())
}
