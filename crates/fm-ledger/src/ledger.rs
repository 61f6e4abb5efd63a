//! The chain, the pending queue, and mining.

use crate::block::{Block, TxRecord, DIFFICULTY, MAX_BLOCK_TRANSACTIONS};
use crate::error::ChainError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared_types::ipc::LedgerTxData;
use std::collections::{HashMap, VecDeque};
use tracing::{error, info};
use uuid::Uuid;

/// Lifecycle state of a ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerTxStatus {
    /// Queued, waiting to be mined into a block.
    Pending,
    /// Included in a mined block.
    Confirmed,
}

/// A transaction as tracked by the ledger. Transitions Pending → Confirmed
/// exactly once, when a mined block includes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Ledger-side id, distinct from the saga transaction id.
    pub id: Uuid,
    /// Id of the originating saga transaction.
    pub transaction_id: Uuid,
    /// Transfer amount.
    pub amount: Decimal,
    /// Source account.
    pub sender: String,
    /// Destination account.
    pub recipient: String,
    /// Submission time.
    pub timestamp: DateTime<Utc>,
    /// Current state.
    pub status: LedgerTxStatus,
    /// Index of the containing block once confirmed.
    pub block_index: Option<u64>,
}

/// Result of looking a transaction up on the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Included in a mined block.
    Confirmed {
        /// Ledger-side transaction id.
        ledger_tx_id: Uuid,
        /// Containing block.
        block_index: u64,
        /// Hash of the containing block.
        block_hash: String,
        /// Depth below the tip, counting the containing block itself.
        confirmations: u64,
    },
    /// Still in the pending queue.
    Pending {
        /// Ledger-side transaction id.
        ledger_tx_id: Uuid,
        /// 1-based position in the queue.
        queue_position: usize,
    },
    /// Unknown to the ledger.
    NotFound,
}

/// Point-in-time summary of the ledger.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerStatus {
    pub chain_length: usize,
    pub total_recorded_transactions: usize,
    pub pending_transactions: usize,
    pub confirmed_transactions: usize,
    pub latest_block_hash: Option<String>,
    pub is_valid: bool,
    pub difficulty: usize,
}

/// The append-only chain plus the FIFO queue of not-yet-mined transactions.
///
/// Single-writer: callers serialize all mutation (the ledger agent does this
/// by owning the ledger behind one lock). Mining mutates
/// the chain tip and the pending queue together, so concurrent `mine` calls
/// are never allowed.
pub struct Ledger {
    chain: Vec<Block>,
    pending: VecDeque<LedgerTransaction>,
    confirmed: HashMap<Uuid, LedgerTransaction>,
    difficulty: usize,
}

impl Ledger {
    /// Create a ledger with the standard difficulty and a proof-of-work
    /// sealed genesis block.
    #[must_use]
    pub fn new() -> Self {
        Self::with_difficulty(DIFFICULTY)
    }

    /// Create a ledger with a custom difficulty.
    ///
    /// The genesis block (index 0, no transactions, `previous_hash = "0"`)
    /// is mined under the same difficulty rule as every later block.
    #[must_use]
    pub fn with_difficulty(difficulty: usize) -> Self {
        let genesis =
            Block::candidate(0, Utc::now(), Vec::new(), "0".to_string()).seal(difficulty);
        info!(hash = %genesis.hash, "genesis block created");
        Self {
            chain: vec![genesis],
            pending: VecDeque::new(),
            confirmed: HashMap::new(),
            difficulty,
        }
    }

    /// Queue a committed transaction for recording.
    ///
    /// Returns the ledger-side transaction, status Pending, appended at the
    /// back of the FIFO queue.
    pub fn submit(&mut self, data: &LedgerTxData) -> LedgerTransaction {
        let tx = LedgerTransaction {
            id: Uuid::new_v4(),
            transaction_id: data.transaction_id,
            amount: data.amount,
            sender: data.sender_account.clone(),
            recipient: data.recipient_account.clone(),
            timestamp: Utc::now(),
            status: LedgerTxStatus::Pending,
            block_index: None,
        };
        self.pending.push_back(tx.clone());
        info!(
            ledger_tx_id = %tx.id,
            transaction_id = %tx.transaction_id,
            queue_length = self.pending.len(),
            "ledger transaction queued"
        );
        tx
    }

    /// Mine the next block from the pending queue.
    ///
    /// Takes up to [`MAX_BLOCK_TRANSACTIONS`] from the front of the queue
    /// (preserving the order of the remainder), seals a block referencing
    /// the current tip, appends it, and confirms the included transactions.
    /// Returns None when nothing is pending.
    pub fn mine(&mut self) -> Option<Block> {
        if self.pending.is_empty() {
            info!("no pending transactions to mine");
            return None;
        }

        let batch_len = self.pending.len().min(MAX_BLOCK_TRANSACTIONS);
        let batch: Vec<LedgerTransaction> = self.pending.drain(..batch_len).collect();
        let records: Vec<TxRecord> = batch
            .iter()
            .map(|tx| TxRecord {
                id: tx.id,
                transaction_id: tx.transaction_id,
                amount: tx.amount,
                sender: tx.sender.clone(),
                recipient: tx.recipient.clone(),
                timestamp: tx.timestamp,
            })
            .collect();

        let index = self.chain.len() as u64;
        let previous_hash = self
            .chain
            .last()
            .map_or_else(|| "0".to_string(), |tip| tip.hash.clone());

        info!(index, transactions = records.len(), "mining new block");
        let block = Block::candidate(index, Utc::now(), records, previous_hash)
            .seal(self.difficulty);

        self.chain.push(block.clone());
        for mut tx in batch {
            tx.status = LedgerTxStatus::Confirmed;
            tx.block_index = Some(block.index);
            self.confirmed.insert(tx.id, tx);
        }

        info!(
            index = block.index,
            nonce = block.nonce,
            hash = %block.hash,
            "block mined"
        );
        Some(block)
    }

    /// Look a saga transaction up across the confirmed set and the pending
    /// queue.
    #[must_use]
    pub fn verify(&self, transaction_id: Uuid) -> Verification {
        if let Some(tx) = self
            .confirmed
            .values()
            .find(|tx| tx.transaction_id == transaction_id)
        {
            if let Some(block) = tx
                .block_index
                .and_then(|index| self.chain.get(index as usize))
            {
                return Verification::Confirmed {
                    ledger_tx_id: tx.id,
                    block_index: block.index,
                    block_hash: block.hash.clone(),
                    confirmations: self.chain.len() as u64 - block.index,
                };
            }
        }

        if let Some((position, tx)) = self
            .pending
            .iter()
            .enumerate()
            .find(|(_, tx)| tx.transaction_id == transaction_id)
        {
            return Verification::Pending {
                ledger_tx_id: tx.id,
                queue_position: position + 1,
            };
        }

        Verification::NotFound
    }

    /// Validate the whole chain, failing fast at the first bad block.
    ///
    /// For every block after genesis: the stored hash must recompute from
    /// the block's own fields, and `previous_hash` must equal the actual
    /// hash of the preceding block.
    pub fn validate(&self) -> Result<(), ChainError> {
        for window in self.chain.windows(2) {
            let (previous, current) = (&window[0], &window[1]);
            if current.hash != current.compute_hash() {
                error!(index = current.index, "invalid hash");
                return Err(ChainError::HashMismatch {
                    index: current.index,
                });
            }
            if current.previous_hash != previous.hash {
                error!(index = current.index, "invalid previous hash");
                return Err(ChainError::BrokenLink {
                    index: current.index,
                });
            }
        }
        Ok(())
    }

    /// Convenience wrapper around [`Ledger::validate`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// The blocks of the chain, genesis first.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// A block by index.
    #[must_use]
    pub fn block(&self, index: u64) -> Option<&Block> {
        self.chain.get(index as usize)
    }

    /// The most recently mined block.
    #[must_use]
    pub fn tip(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Current summary snapshot.
    #[must_use]
    pub fn status(&self) -> LedgerStatus {
        LedgerStatus {
            chain_length: self.chain.len(),
            total_recorded_transactions: self
                .chain
                .iter()
                .map(|block| block.transactions.len())
                .sum(),
            pending_transactions: self.pending.len(),
            confirmed_transactions: self.confirmed.len(),
            latest_block_hash: self.chain.last().map(|block| block.hash.clone()),
            is_valid: self.is_valid(),
            difficulty: self.difficulty,
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
