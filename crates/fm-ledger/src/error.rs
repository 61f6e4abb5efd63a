//! Chain validation errors.

use thiserror::Error;

/// A chain-integrity violation, reported with the index of the first block
/// that failed. Validation stops at the first mismatch; the whole chain is
/// considered invalid.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// A block's stored hash no longer matches the hash recomputed from its
    /// own fields.
    #[error("invalid hash at block {index}: stored hash does not recompute")]
    HashMismatch {
        /// Index of the tampered block.
        index: u64,
    },

    /// A block's `previous_hash` does not equal the actual hash of the block
    /// before it.
    #[error("broken link at block {index}: previous_hash does not match predecessor")]
    BrokenLink {
        /// Index of the block whose back-link is wrong.
        index: u64,
    },
}

impl ChainError {
    /// Index of the block where validation failed.
    #[must_use]
    pub fn index(&self) -> u64 {
        match self {
            Self::HashMismatch { index } | Self::BrokenLink { index } => *index,
        }
    }
}
