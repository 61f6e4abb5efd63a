//! Transaction lifecycle entity.
//!
//! The [`Transaction`] is created and owned exclusively by the saga
//! coordinator; other agents only ever see copies of its fields inside
//! message payloads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Metadata key set when a transaction reaches the `Failed` state.
pub const FAILURE_REASON_KEY: &str = "failure_reason";

/// Lifecycle state of a transaction.
///
/// `Pending` is the only non-terminal state. Once a transaction reaches
/// `Completed` or `Failed` it never transitions again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Awaiting validation responses.
    Pending,
    /// Terminal: committed.
    Completed,
    /// Terminal: aborted, `metadata.failure_reason` holds the cause.
    Failed,
}

impl TransactionStatus {
    /// Whether the status is terminal (no further transitions allowed).
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// A financial transaction moving through the validation saga.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction id; doubles as the saga correlation id.
    pub id: Uuid,
    /// Transfer amount.
    pub amount: Decimal,
    /// Source account.
    pub sender_account: String,
    /// Destination account.
    pub recipient_account: String,
    /// ISO currency code.
    pub currency: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: TransactionStatus,
    /// Free-form annotations; `failure_reason` is set on failure.
    pub metadata: Map<String, Value>,
}

impl Transaction {
    /// Create a fresh pending transaction with a new id.
    #[must_use]
    pub fn new(
        amount: Decimal,
        sender_account: impl Into<String>,
        recipient_account: impl Into<String>,
        currency: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            sender_account: sender_account.into(),
            recipient_account: recipient_account.into(),
            currency: currency.into(),
            timestamp: Utc::now(),
            status: TransactionStatus::Pending,
            metadata: metadata.unwrap_or_default(),
        }
    }

    /// The recorded failure reason, if the transaction failed.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        self.metadata.get(FAILURE_REASON_KEY).and_then(Value::as_str)
    }
}
