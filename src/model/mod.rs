//! Core value types: chunks/digests and generalized indices

mod gindex;
mod hash;

pub use gindex::{Gindex, GindexPath, MAX_DEPTH};
pub use hash::{Hash, BYTES_PER_CHUNK};
