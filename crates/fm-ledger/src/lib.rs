//! # Ledger - Append-Only Proof-of-Work Chain
//!
//! Records committed transactions in blocks sealed by a brute-force
//! proof-of-work search and linked by previous-block hashes. Single-node and
//! in-memory by design: the proof-of-work is an immutability simulation, not
//! a security mechanism, and there is no consensus or persistence.
//!
//! - [`block`] - block structure, canonical hashing, and the nonce search
//! - [`ledger`] - pending queue, batch mining, verification, chain validation
//! - [`agent`] - the bus-facing ledger participant
//!
//! The chain and pending queue are mutated under a single-writer discipline:
//! every mutation goes through one lock, and mining runs inline in the
//! agent's handler. The nonce search occupies only the ledger agent's own
//! mailbox; the rest of the mesh keeps exchanging messages.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent;
pub mod block;
pub mod error;
pub mod ledger;

pub use agent::LedgerAgent;
pub use block::{Block, TxRecord, DIFFICULTY, MAX_BLOCK_TRANSACTIONS};
pub use error::ChainError;
pub use ledger::{Ledger, LedgerStatus, LedgerTransaction, LedgerTxStatus, Verification};
