//! # Shared Bus - Message Routing Between Agents
//!
//! Process-wide directory of participants plus an append-only message
//! history. All inter-agent communication goes through the bus; agents never
//! call each other directly.
//!
//! ## Delivery model
//!
//! ```text
//! ┌──────────────┐  send(recipient, ..)  ┌──────────────┐
//! │   Agent A    │ ────────────────────▶ │ Message Bus  │
//! └──────────────┘                       │  + history   │
//!                                        └──────┬───────┘
//!                                  enqueue      │
//!                                               ▼
//!                                        ┌──────────────┐   mailbox task
//!                                        │   Agent B    │ ◀─────────────
//!                                        └──────────────┘
//! ```
//!
//! Each registered participant gets its own mailbox task, so delivery is
//! asynchronous and participants handle messages concurrently with each
//! other. Ordering guarantees:
//!
//! - messages to one recipient are handled in the order they were sent
//! - the global history reflects global send order
//! - there is no ordering across different recipients
//!
//! Sending to an unregistered participant records the message in history but
//! delivers nothing; agents may register lazily, so a routing miss is a
//! design-level no-op rather than an error.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod message;
pub mod participant;

pub use bus::MessageBus;
pub use message::{Message, ParticipantId};
pub use participant::Participant;
