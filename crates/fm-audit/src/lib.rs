//! # Audit - Append-Only Event Trail
//!
//! Terminal sink of the pipeline: every lifecycle outcome and alert lands
//! here as an [`AuditRecord`], and a running [`AuditSummary`] counts them.
//! The trail is append-only and in-memory; nothing in the system reads it
//! back except reporting accessors.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod agent;

pub use agent::{AuditAgent, AuditRecord, AuditSummary};
