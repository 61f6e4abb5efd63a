//! Audit agent, record type, and summary counters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::ipc::msg_type;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// One entry in the audit trail.
///
/// The payload is kept as raw JSON: audit records every event shape it
/// receives, known or not, without decoding it into a typed struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub event_type: String,
    pub source: ParticipantId,
    pub timestamp: DateTime<Utc>,
    pub details: Value,
}

/// Running counters over the audit trail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total_transactions: u64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub fraud_incidents: u64,
    pub compliance_violations: u64,
    pub threat_alerts: u64,
    pub resource_shortages: u64,
}

#[derive(Default)]
struct AuditLog {
    records: Vec<AuditRecord>,
    summary: AuditSummary,
}

/// The audit agent, registered on the bus as `audit_agent`.
///
/// Accepts every message type: known lifecycle and alert events update the
/// summary counters, anything else is recorded as a generic `system_event`.
#[derive(Clone)]
pub struct AuditAgent {
    id: ParticipantId,
    log: Arc<Mutex<AuditLog>>,
}

impl AuditAgent {
    /// Create the agent and register it on the bus.
    #[must_use]
    pub fn new(bus: &Arc<MessageBus>) -> Self {
        let agent = Self {
            id: agents::AUDIT_AGENT.into(),
            log: Arc::new(Mutex::new(AuditLog::default())),
        };
        bus.register(agent.clone());
        info!(agent = %agent.id, "audit agent initialized");
        agent
    }

    /// Current summary counters.
    #[must_use]
    pub fn summary(&self) -> AuditSummary {
        self.log.lock().summary
    }

    /// All recorded events, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.log.lock().records.clone()
    }

    /// Recorded events of one type, oldest first.
    #[must_use]
    pub fn records_of_type(&self, event_type: &str) -> Vec<AuditRecord> {
        self.log
            .lock()
            .records
            .iter()
            .filter(|r| r.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.log.lock().records.len()
    }

    fn record(&self, message: &Message) {
        let mut log = self.log.lock();

        let event_type = match message.message_type.as_str() {
            msg_type::TRANSACTION_COMPLETED => {
                log.summary.total_transactions += 1;
                log.summary.successful_transactions += 1;
                message.message_type.clone()
            }
            msg_type::TRANSACTION_FAILED => {
                log.summary.total_transactions += 1;
                log.summary.failed_transactions += 1;
                if message
                    .payload
                    .get("reason")
                    .and_then(Value::as_str)
                    .is_some_and(|r| r.starts_with("Fraud detected"))
                {
                    log.summary.fraud_incidents += 1;
                }
                message.message_type.clone()
            }
            msg_type::COMPLIANCE_VIOLATION => {
                log.summary.compliance_violations += 1;
                message.message_type.clone()
            }
            msg_type::THREAT_ALERT => {
                log.summary.threat_alerts += 1;
                message.message_type.clone()
            }
            msg_type::RESOURCE_SHORTAGE => {
                log.summary.resource_shortages += 1;
                message.message_type.clone()
            }
            _ => "system_event".to_string(),
        };

        log.records.push(AuditRecord {
            id: Uuid::new_v4(),
            event_type,
            source: message.sender.clone(),
            timestamp: Utc::now(),
            details: message.payload.clone(),
        });
    }
}

#[async_trait]
impl Participant for AuditAgent {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        self.record(&message);
    }
}
