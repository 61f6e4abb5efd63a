//! Block structure, canonical hashing, and proof-of-work sealing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Required number of leading zero hex characters in a sealed block hash.
///
/// Proof-of-work cost grows exponentially with this value; 4 keeps the
/// simulation cheap while still making tampering detectable.
pub const DIFFICULTY: usize = 4;

/// Maximum number of transactions mined into one block.
pub const MAX_BLOCK_TRANSACTIONS: usize = 10;

/// A transaction as recorded inside a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxRecord {
    /// Ledger-side transaction id.
    pub id: Uuid,
    /// Id of the originating saga transaction.
    pub transaction_id: Uuid,
    /// Transfer amount.
    pub amount: Decimal,
    /// Source account.
    pub sender: String,
    /// Destination account.
    pub recipient: String,
    /// Time the transaction was submitted to the ledger.
    pub timestamp: DateTime<Utc>,
}

/// One block in the chain. Immutable once sealed; only the ledger produces
/// blocks, in strictly increasing index order starting from the genesis
/// block at index 0 (whose `previous_hash` is `"0"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain.
    pub index: u64,
    /// Time the block was assembled.
    pub timestamp: DateTime<Utc>,
    /// Transactions recorded in this block, in submission order.
    pub transactions: Vec<TxRecord>,
    /// Hash of the preceding block (`"0"` for genesis).
    pub previous_hash: String,
    /// SHA-256 hex digest over the block's own fields.
    pub hash: String,
    /// Proof-of-work counter found by [`Block::seal`].
    pub nonce: u64,
}

impl Block {
    /// Assemble an unsealed candidate block (hash empty, nonce 0).
    #[must_use]
    pub fn candidate(
        index: u64,
        timestamp: DateTime<Utc>,
        transactions: Vec<TxRecord>,
        previous_hash: String,
    ) -> Self {
        Self {
            index,
            timestamp,
            transactions,
            previous_hash,
            hash: String::new(),
            nonce: 0,
        }
    }

    /// Recompute the block hash from its own fields.
    ///
    /// The preimage folds in every field except `hash` itself, with
    /// timestamps in RFC 3339 form, so equal inputs always produce equal
    /// digests.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.index.to_be_bytes());
        hasher.update(self.timestamp.to_rfc3339().as_bytes());
        for tx in &self.transactions {
            hasher.update(tx.id.as_bytes());
            hasher.update(tx.transaction_id.as_bytes());
            hasher.update(tx.amount.to_string().as_bytes());
            hasher.update(tx.sender.as_bytes());
            hasher.update(tx.recipient.as_bytes());
            hasher.update(tx.timestamp.to_rfc3339().as_bytes());
        }
        hasher.update(self.previous_hash.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        hex::encode(hasher.finalize())
    }

    /// Brute-force the nonce until the hash meets the difficulty predicate.
    ///
    /// Starts at nonce 0 and increments; with identical inputs the search is
    /// fully deterministic. No shortcut exists, and no upper bound is
    /// enforced (non-termination at absurd difficulties is a liveness
    /// assumption, not a handled error).
    #[must_use]
    pub fn seal(mut self, difficulty: usize) -> Self {
        self.nonce = 0;
        self.hash = self.compute_hash();
        while !has_leading_zeros(&self.hash, difficulty) {
            self.nonce += 1;
            self.hash = self.compute_hash();
        }
        self
    }

    /// Whether the stored hash satisfies the difficulty predicate.
    #[must_use]
    pub fn satisfies_difficulty(&self, difficulty: usize) -> bool {
        has_leading_zeros(&self.hash, difficulty)
    }
}

/// Difficulty predicate: at least `count` leading `'0'` characters.
#[must_use]
pub fn has_leading_zeros(hash: &str, count: usize) -> bool {
    hash.len() >= count && hash.bytes().take(count).all(|b| b == b'0')
}
