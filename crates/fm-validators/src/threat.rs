//! Threat classification agent.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::ipc::{self, msg_type, FraudAlert, Severity, ThreatAlertEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Map a fraud risk score onto an alert severity.
#[must_use]
pub fn severity_for(risk_score: f64) -> Severity {
    if risk_score >= 0.8 {
        Severity::High
    } else if risk_score >= 0.5 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn mitigation_actions(severity: Severity) -> Vec<String> {
    let actions: &[&str] = match severity {
        Severity::High => &["freeze_account", "block_transaction", "notify_security_team"],
        Severity::Medium => &["flag_for_review", "notify_security_team"],
        Severity::Low => &["monitor_account"],
    };
    actions.iter().map(|a| (*a).to_string()).collect()
}

/// The threat detector, registered on the bus as `threat_detector`.
///
/// Consumes `fraud_alert` messages, grades them by risk score, keeps the
/// alert log, and forwards a `threat_alert` to audit.
#[derive(Clone)]
pub struct ThreatAgent {
    bus: Arc<MessageBus>,
    id: ParticipantId,
    alerts: Arc<Mutex<Vec<ThreatAlertEvent>>>,
}

impl ThreatAgent {
    /// Create the agent and register it on the bus.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>) -> Self {
        let agent = Self {
            bus: bus.clone(),
            id: agents::THREAT_DETECTOR.into(),
            alerts: Arc::new(Mutex::new(Vec::new())),
        };
        bus.register(agent.clone());
        info!(agent = %agent.id, "threat agent initialized");
        agent
    }

    /// All alerts recorded so far, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<ThreatAlertEvent> {
        self.alerts.lock().clone()
    }

    /// Alerts at or above the given severity.
    #[must_use]
    pub fn alerts_at_least(&self, severity: Severity) -> Vec<ThreatAlertEvent> {
        self.alerts
            .lock()
            .iter()
            .filter(|a| a.severity >= severity)
            .cloned()
            .collect()
    }

    fn on_fraud_alert(&self, message: &Message, alert: FraudAlert) {
        let severity = severity_for(alert.risk_score);
        let event = ThreatAlertEvent {
            alert_id: Uuid::new_v4(),
            threat_type: "fraud".to_string(),
            severity,
            timestamp: Utc::now(),
            description: format!(
                "Fraudulent transaction {} from account {} (risk {:.2}): {}",
                alert.transaction_id,
                alert.sender_account,
                alert.risk_score,
                alert.indicators.join(", ")
            ),
            mitigation_actions: mitigation_actions(severity),
        };
        info!(
            alert_id = %event.alert_id,
            severity = ?severity,
            transaction_id = %alert.transaction_id,
            "threat alert raised"
        );

        self.alerts.lock().push(event.clone());
        self.bus.send(
            &self.id,
            &agents::AUDIT_AGENT.into(),
            msg_type::THREAT_ALERT,
            ipc::to_payload(&event),
            message.correlation_id,
        );
    }
}

#[async_trait]
impl Participant for ThreatAgent {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        match message.message_type.as_str() {
            msg_type::FRAUD_ALERT => match ipc::from_payload::<FraudAlert>(&message.payload) {
                Ok(alert) => self.on_fraud_alert(&message, alert),
                Err(e) => warn!(error = %e, "malformed fraud_alert dropped"),
            },
            other => {
                debug!(message_type = other, "ignoring unknown message type");
            }
        }
    }
}
