//! Message envelope and participant identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a bus participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ParticipantId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable message envelope routed between participants.
///
/// `correlation_id`, when present, ties a response to the request that
/// spawned it; for saga messages it always equals the originating
/// transaction id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique per-message id.
    pub id: Uuid,
    /// Originating participant.
    pub sender: ParticipantId,
    /// Addressed participant.
    pub recipient: ParticipantId,
    /// Dispatch tag; see `shared_types::ipc::msg_type`.
    pub message_type: String,
    /// JSON payload; shape is determined by `message_type`.
    pub payload: Value,
    /// Send time.
    pub timestamp: DateTime<Utc>,
    /// Request/response correlation, when applicable.
    pub correlation_id: Option<Uuid>,
}

impl Message {
    /// Construct a fresh envelope stamped with a new id and the current time.
    #[must_use]
    pub fn new(
        sender: ParticipantId,
        recipient: ParticipantId,
        message_type: impl Into<String>,
        payload: Value,
        correlation_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            recipient,
            message_type: message_type.into(),
            payload,
            timestamp: Utc::now(),
            correlation_id,
        }
    }

    /// Whether this message involves the given participant as sender or
    /// recipient.
    #[must_use]
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        self.sender == *participant || self.recipient == *participant
    }
}
