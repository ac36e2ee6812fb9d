//! Error types for persistent_merkle

use thiserror::Error;

/// Result type alias for persistent_merkle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building, navigating or proving a tree
///
/// Every variant is a precondition violation detected at the call that
/// received the bad input. None of them are transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid digest length: expected 32 bytes, got {0}")]
    InvalidDigestLength(usize),

    #[error("Invalid depth {depth}: maximum is {max}")]
    InvalidDepth { depth: usize, max: usize },

    #[error("Invalid gindex: {0}")]
    InvalidGindex(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("Too many nodes: {count} do not fit at depth {depth}")]
    TooManyNodes { count: u64, depth: usize },

    #[error("Mismatched lengths: {left} vs {right}")]
    MismatchedLengths { left: usize, right: usize },

    #[error("Invalid packing: {0}")]
    InvalidPacking(String),
}
