//! Generalized indices: root-to-node paths packed into an integer
//!
//! The most significant set bit marks the root. Every bit below it is one
//! step, read from high to low: `0` goes left, `1` goes right. So `1` is the
//! root, `2`/`3` are its children and `2^d + i` is the `i`-th node at depth `d`.

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Deepest level a [`Gindex`] can address
pub const MAX_DEPTH: usize = 127;

/// A generalized index (always `>= 1`)
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gindex(u128);

impl Gindex {
    /// The root of any tree
    pub const ROOT: Gindex = Gindex(1);

    /// Wrap a raw value, rejecting `0`
    pub fn new(value: u128) -> Result<Self> {
        if value == 0 {
            return Err(Error::InvalidGindex("gindex must be >= 1".into()));
        }
        Ok(Gindex(value))
    }

    /// The raw integer
    pub fn value(self) -> u128 {
        self.0
    }

    /// `floor(log2(g))`: the number of steps from the root
    pub fn depth(self) -> usize {
        MAX_DEPTH - self.0.leading_zeros() as usize
    }

    /// Direction of the step taken at `level` (0 = the step right after the
    /// root). `true` means right.
    pub fn bit_at(self, level: usize) -> Result<bool> {
        let depth = self.depth();
        if level >= depth {
            return Err(Error::InvalidGindex(format!(
                "level {} is not below gindex {} of depth {}",
                level, self.0, depth
            )));
        }
        Ok((self.0 >> (depth - 1 - level)) & 1 == 1)
    }

    /// `2^depth + index`
    pub fn from_index_at_depth(depth: usize, index: u64) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::InvalidDepth {
                depth,
                max: MAX_DEPTH,
            });
        }
        if depth < 64 && index >> depth != 0 {
            return Err(Error::InvalidGindex(format!(
                "index {} does not fit at depth {}",
                index, depth
            )));
        }
        Ok(Gindex((1u128 << depth) | index as u128))
    }

    /// Address of the node `rel_index` positions into the row `depth` levels
    /// below `self`: `self * 2^depth + rel_index`
    pub fn concat(self, depth: usize, rel_index: u128) -> Result<Self> {
        let total = self.depth() + depth;
        if total > MAX_DEPTH {
            return Err(Error::InvalidDepth {
                depth: total,
                max: MAX_DEPTH,
            });
        }
        if rel_index >> depth != 0 {
            return Err(Error::InvalidGindex(format!(
                "relative index {} does not fit at depth {}",
                rel_index, depth
            )));
        }
        Ok(Gindex((self.0 << depth) | rel_index))
    }

    /// Follow `self` and then the path of `other` (taken relative to the node
    /// `self` points at)
    pub fn append(self, other: Gindex) -> Result<Self> {
        let depth = other.depth();
        self.concat(depth, other.0 ^ (1u128 << depth))
    }

    /// Left child
    pub fn left(self) -> Result<Self> {
        self.concat(1, 0)
    }

    /// Right child
    pub fn right(self) -> Result<Self> {
        self.concat(1, 1)
    }

    /// Parent, or `None` for the root
    pub fn parent(self) -> Option<Self> {
        if self.0 == 1 {
            None
        } else {
            Some(Gindex(self.0 >> 1))
        }
    }

    /// The other child of the same parent, or `None` for the root
    pub fn sibling(self) -> Option<Self> {
        if self.0 == 1 {
            None
        } else {
            Some(Gindex(self.0 ^ 1))
        }
    }

    /// Whether this node is the left child of its parent
    pub fn is_left(self) -> bool {
        self.0 != 1 && self.0 & 1 == 0
    }

    /// Whether `other` lies strictly below `self`
    pub fn is_ancestor_of(self, other: Gindex) -> bool {
        let (d, od) = (self.depth(), other.depth());
        od > d && other.0 >> (od - d) == self.0
    }

    /// Steps from the root down to this node (`true` = right)
    pub fn path(self) -> GindexPath {
        GindexPath {
            gindex: self.0,
            remaining: self.depth(),
        }
    }

    /// Path bits left-aligned to [`MAX_DEPTH`], so that ordering the aligned
    /// values (ties broken by depth) is a depth-first, left-to-right walk
    pub(crate) fn aligned(self) -> u128 {
        self.0 << (MAX_DEPTH - self.depth())
    }
}

/// Iterator over the steps of a [`Gindex`], root first
pub struct GindexPath {
    gindex: u128,
    remaining: usize,
}

impl Iterator for GindexPath {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some((self.gindex >> self.remaining) & 1 == 1)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for GindexPath {}

impl TryFrom<u128> for Gindex {
    type Error = Error;

    fn try_from(value: u128) -> Result<Self> {
        Gindex::new(value)
    }
}

impl TryFrom<u64> for Gindex {
    type Error = Error;

    fn try_from(value: u64) -> Result<Self> {
        Gindex::new(value as u128)
    }
}

impl From<Gindex> for u128 {
    fn from(g: Gindex) -> u128 {
        g.0
    }
}

impl FromStr for Gindex {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value = s
            .trim()
            .parse::<u128>()
            .map_err(|e| Error::InvalidGindex(format!("{}: {}", s, e)))?;
        Gindex::new(value)
    }
}

// Decimal strings, since JSON numbers cannot carry the full u128 range
impl Serialize for Gindex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Gindex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Gindex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Gindex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gindex({})", self.0)
    }
}
