//! Well-known participant identifiers.
//!
//! Every agent registers on the bus under one of these ids, and senders
//! address requests to them. Registration is lazy: sending to an id that has
//! not registered yet records the message in history without delivering it.

/// Saga coordinator owning the transaction lifecycle.
pub const TRANSACTION_PROCESSOR: &str = "transaction_processor";

/// Fraud scoring collaborator.
pub const FRAUD_DETECTOR: &str = "fraud_detector";

/// Regulatory compliance collaborator.
pub const COMPLIANCE_AGENT: &str = "compliance_agent";

/// Computational resource collaborator.
pub const RESOURCE_ALLOCATOR: &str = "resource_allocator";

/// Security threat collaborator.
pub const THREAT_DETECTOR: &str = "threat_detector";

/// Lifecycle event observer.
pub const AUDIT_AGENT: &str = "audit_agent";

/// Append-only proof-of-work ledger.
pub const BLOCKCHAIN_AGENT: &str = "blockchain_agent";
