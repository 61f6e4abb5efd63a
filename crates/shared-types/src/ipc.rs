//! Inter-agent message payloads.
//!
//! Every message on the bus carries a `message_type` string from
//! [`msg_type`] and a JSON payload whose shape is one of the structs below.
//! Payloads are encoded with [`to_payload`] on the sending side and decoded
//! with [`from_payload`] on the receiving side; a payload that fails to
//! decode is a local problem for the receiver (logged and ignored), never a
//! system fault.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

/// Message-type names, as they appear in [`Message::message_type`].
///
/// [`Message::message_type`]: https://docs.rs/shared-bus
pub mod msg_type {
    /// Coordinator → fraud detector.
    pub const FRAUD_CHECK_REQUEST: &str = "fraud_check_request";
    /// Fraud detector → coordinator.
    pub const FRAUD_CHECK_RESPONSE: &str = "fraud_check_response";
    /// Coordinator → compliance agent.
    pub const COMPLIANCE_CHECK_REQUEST: &str = "compliance_check_request";
    /// Compliance agent → coordinator.
    pub const COMPLIANCE_CHECK_RESPONSE: &str = "compliance_check_response";
    /// Coordinator → resource allocator.
    pub const RESOURCE_REQUEST: &str = "resource_request";
    /// Resource allocator → coordinator, allocation succeeded.
    pub const RESOURCE_ALLOCATED: &str = "resource_allocated";
    /// Resource allocator → coordinator, allocation refused.
    pub const RESOURCE_ALLOCATION_FAILED: &str = "resource_allocation_failed";
    /// Any → resource allocator, return a prior grant.
    pub const RELEASE_RESOURCES: &str = "release_resources";
    /// Coordinator → audit agent.
    pub const TRANSACTION_COMPLETED: &str = "transaction_completed";
    /// Coordinator → audit agent.
    pub const TRANSACTION_FAILED: &str = "transaction_failed";
    /// Fraud detector → threat detector.
    pub const FRAUD_ALERT: &str = "fraud_alert";
    /// Compliance agent → audit agent.
    pub const COMPLIANCE_VIOLATION: &str = "compliance_violation";
    /// Threat detector → audit agent.
    pub const THREAT_ALERT: &str = "threat_alert";
    /// Resource allocator → audit agent.
    pub const RESOURCE_SHORTAGE: &str = "resource_shortage";
    /// Any → ledger agent, queue a transaction for recording.
    pub const BLOCKCHAIN_RECORD_REQUEST: &str = "blockchain_record_request";
    /// Ledger agent → requester.
    pub const BLOCKCHAIN_RECORD_RESPONSE: &str = "blockchain_record_response";
    /// Any → ledger agent, look a transaction up on the chain.
    pub const BLOCKCHAIN_VERIFY_REQUEST: &str = "blockchain_verify_request";
    /// Ledger agent → requester.
    pub const BLOCKCHAIN_VERIFY_RESPONSE: &str = "blockchain_verify_response";
    /// Any → ledger agent, mine the pending queue now.
    pub const MINE_BLOCK_REQUEST: &str = "mine_block_request";
    /// Ledger agent → requester after a successful mine.
    pub const BLOCK_MINED: &str = "block_mined";
}

/// Encode a payload struct into the JSON value carried by a message.
///
/// Serialization of these plain data structs cannot fail in practice; if it
/// ever does the payload degrades to `null` and the error is logged.
pub fn to_payload<T: Serialize>(payload: &T) -> Value {
    serde_json::to_value(payload).unwrap_or_else(|e| {
        error!(error = %e, "payload serialization failed");
        Value::Null
    })
}

/// Decode a message payload into a typed struct.
pub fn from_payload<T: DeserializeOwned>(payload: &Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(payload.clone())
}

/// Transaction fields copied into validation requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionData {
    pub amount: Decimal,
    pub sender_account: String,
    pub recipient_account: String,
    pub currency: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

/// `fraud_check_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCheckRequest {
    pub transaction_id: Uuid,
    pub transaction_data: TransactionData,
}

/// `fraud_check_response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudCheckResponse {
    pub transaction_id: Uuid,
    pub is_fraudulent: bool,
    pub risk_score: f64,
    #[serde(default)]
    pub fraud_indicators: Vec<String>,
    pub reason: String,
}

/// `compliance_check_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheckRequest {
    pub transaction_id: Uuid,
    pub transaction_data: TransactionData,
}

/// A single rule violation inside a compliance response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleViolation {
    pub rule: String,
    pub description: String,
}

/// `compliance_check_response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceCheckResponse {
    pub transaction_id: Uuid,
    pub is_compliant: bool,
    pub compliance_score: f64,
    #[serde(default)]
    pub violations: Vec<RuleViolation>,
    pub reason: String,
}

/// Processing priority hint carried in resource requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

/// Estimated processing complexity carried in resource requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    #[default]
    Low,
    Medium,
    High,
}

/// `resource_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub transaction_id: Uuid,
    #[serde(default)]
    pub processing_priority: Priority,
    #[serde(default)]
    pub estimated_complexity: Complexity,
}

/// A bundle of resource quantities (grant, requirement, or availability).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu_units: u32,
    pub memory_mb: u32,
    pub network_bandwidth: u32,
}

/// `resource_allocated`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAllocated {
    pub transaction_id: Uuid,
    pub allocated: bool,
    #[serde(flatten)]
    pub granted: ResourceUsage,
}

/// `resource_allocation_failed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAllocationFailed {
    pub transaction_id: Uuid,
    pub allocated: bool,
    pub reason: String,
    pub required: ResourceUsage,
    pub available: ResourceUsage,
}

/// `release_resources`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseResources {
    pub transaction_id: Uuid,
}

/// `transaction_completed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionCompleted {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// `transaction_failed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFailed {
    pub transaction_id: Uuid,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// `fraud_alert`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudAlert {
    pub transaction_id: Uuid,
    pub sender_account: String,
    pub risk_score: f64,
    #[serde(default)]
    pub indicators: Vec<String>,
}

/// `compliance_violation`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceViolation {
    pub transaction_id: Uuid,
    pub violations: Vec<RuleViolation>,
    pub sender_account: String,
    pub amount: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Severity attached to threat alerts and audit records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// `threat_alert`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreatAlertEvent {
    pub alert_id: Uuid,
    pub threat_type: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub mitigation_actions: Vec<String>,
}

/// `resource_shortage`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceShortage {
    pub transaction_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub required: ResourceUsage,
    pub available: ResourceUsage,
}

/// Transaction fields submitted to the ledger for recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerTxData {
    pub transaction_id: Uuid,
    pub amount: Decimal,
    pub sender_account: String,
    pub recipient_account: String,
}

/// `blockchain_record_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecordRequest {
    pub transaction_data: LedgerTxData,
}

/// `blockchain_record_response`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecordResponse {
    pub transaction_id: Uuid,
    pub ledger_tx_id: Uuid,
    pub status: String,
    pub message: String,
}

/// `blockchain_verify_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerVerifyRequest {
    pub transaction_id: Uuid,
}

/// `blockchain_verify_response`
///
/// Exactly one of the optional field groups is populated, according to
/// `status` (`confirmed`, `pending`, or `not_found`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerVerifyResponse {
    pub transaction_id: Uuid,
    pub verified: bool,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_tx_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_position: Option<usize>,
}

/// `block_mined`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockMined {
    pub block_index: u64,
    pub block_hash: String,
    pub transaction_count: usize,
}
