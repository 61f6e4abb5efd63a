//! # Shared Types - Cross-Agent Domain Definitions
//!
//! Single source of truth for the types that cross agent boundaries:
//!
//! - [`entities`] - the transaction lifecycle entity owned by the saga
//!   coordinator
//! - [`ipc`] - message-type names and typed payload structs for every
//!   message exchanged over the shared bus
//! - [`agents`] - well-known participant identifiers
//!
//! Agents never share mutable state; everything that moves between them is a
//! payload defined here, serialized into a message envelope.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agents;
pub mod entities;
pub mod ipc;

pub use entities::{Transaction, TransactionStatus};
