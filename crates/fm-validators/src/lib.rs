//! # Validators - Fraud, Compliance, Resource, and Threat Agents
//!
//! The pluggable validation side of the pipeline. Each agent is a bus
//! participant that consumes a request type, applies a pure policy to it,
//! and responds to the requester under the request's correlation id:
//!
//! - [`fraud`] - risk scoring over amounts and transfer history
//! - [`compliance`] - regulatory rule checks with per-day sender totals
//! - [`resource`] - bounded pool allocation by priority and complexity
//! - [`threat`] - severity classification of fraud alerts
//!
//! Policies are plain structs with no bus knowledge, tested directly; the
//! agents wrap them with payload decoding, response routing, and the audit
//! side-channels (`fraud_alert`, `compliance_violation`, `threat_alert`,
//! `resource_shortage`).

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod compliance;
pub mod fraud;
pub mod resource;
pub mod threat;

pub use compliance::{ComplianceAgent, CompliancePolicy, ComplianceResult};
pub use fraud::{FraudAgent, FraudPolicy, RiskAssessment};
pub use resource::{ResourceAgent, ResourcePool, Shortage};
pub use threat::ThreatAgent;
