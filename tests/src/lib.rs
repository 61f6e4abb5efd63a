//! # FinMesh Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # Cross-agent choreography
//!     ├── pipeline.rs     # Saga fan-out through fraud/compliance/resources
//!     └── ledger_flow.rs  # Record, mine, and verify over the bus
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p fm-tests
//!
//! # By category
//! cargo test -p fm-tests integration::pipeline::
//! cargo test -p fm-tests integration::ledger_flow::
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod integration;
