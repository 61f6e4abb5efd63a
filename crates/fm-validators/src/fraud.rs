//! Fraud scoring policy and agent.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::ipc::{
    self, msg_type, FraudAlert, FraudCheckRequest, FraudCheckResponse, TransactionData,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Risk score above which a transaction is flagged as fraudulent.
pub const FRAUD_THRESHOLD: f64 = 0.5;

/// Window for the rapid-transaction indicator.
const RAPID_WINDOW_SECS: i64 = 300;
/// Minimum sends from one account inside the window to trigger the
/// rapid-transaction indicator, current transaction included.
const RAPID_COUNT: usize = 5;
/// Window for the round-trip indicator.
const ROUND_TRIP_WINDOW_SECS: i64 = 3600;

/// Outcome of scoring one transaction.
#[derive(Debug, Clone)]
pub struct RiskAssessment {
    /// Accumulated risk, capped at 1.0.
    pub risk_score: f64,
    /// Names of the indicators that fired.
    pub indicators: Vec<String>,
}

impl RiskAssessment {
    /// Whether the score crosses the fraud threshold.
    #[must_use]
    pub fn is_fraudulent(&self) -> bool {
        self.risk_score > FRAUD_THRESHOLD
    }

    /// Human-readable verdict for the response payload.
    #[must_use]
    pub fn reason(&self) -> String {
        if self.is_fraudulent() {
            format!("Risk indicators detected: {}", self.indicators.join(", "))
        } else {
            "No fraud indicators detected".to_string()
        }
    }
}

struct SeenTransfer {
    sender: String,
    recipient: String,
    timestamp: DateTime<Utc>,
}

/// Stateful risk-scoring policy.
///
/// Keeps the full transfer history it has scored; the rapid-transaction and
/// round-trip indicators look back into that history. History grows without
/// bound, acceptable for an in-memory simulation.
#[derive(Default)]
pub struct FraudPolicy {
    history: Vec<SeenTransfer>,
}

impl FraudPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Score a transaction at the given instant and record it in history.
    pub fn assess(&mut self, data: &TransactionData, now: DateTime<Utc>) -> RiskAssessment {
        let mut risk_score: f64 = 0.0;
        let mut indicators = Vec::new();

        if data.amount > Decimal::from(10_000) {
            risk_score += 0.3;
            indicators.push("high_amount".to_string());
        }

        if is_suspicious_amount(data.amount) {
            risk_score += 0.2;
            indicators.push("suspicious_amount_pattern".to_string());
        }

        let rapid_cutoff = now - Duration::seconds(RAPID_WINDOW_SECS);
        let recent_sends = self
            .history
            .iter()
            .filter(|t| t.sender == data.sender_account && t.timestamp >= rapid_cutoff)
            .count();
        if recent_sends + 1 >= RAPID_COUNT {
            risk_score += 0.4;
            indicators.push("rapid_transactions".to_string());
        }

        let round_trip_cutoff = now - Duration::seconds(ROUND_TRIP_WINDOW_SECS);
        let round_trip = self.history.iter().any(|t| {
            t.sender == data.recipient_account
                && t.recipient == data.sender_account
                && t.timestamp >= round_trip_cutoff
        });
        if round_trip {
            risk_score += 0.5;
            indicators.push("round_trip_pattern".to_string());
        }

        self.history.push(SeenTransfer {
            sender: data.sender_account.clone(),
            recipient: data.recipient_account.clone(),
            timestamp: now,
        });

        RiskAssessment {
            risk_score: risk_score.min(1.0),
            indicators,
        }
    }
}

/// Amounts commonly used to probe payment systems.
fn is_suspicious_amount(amount: Decimal) -> bool {
    const PATTERNS: [(i64, u32); 3] = [(99999, 2), (123456, 2), (500000, 2)];
    PATTERNS
        .iter()
        .any(|&(mantissa, scale)| amount == Decimal::new(mantissa, scale))
}

/// The fraud detector, registered on the bus as `fraud_detector`.
#[derive(Clone)]
pub struct FraudAgent {
    bus: Arc<MessageBus>,
    id: ParticipantId,
    policy: Arc<Mutex<FraudPolicy>>,
}

impl FraudAgent {
    /// Create the agent and register it on the bus.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>) -> Self {
        let agent = Self {
            bus: bus.clone(),
            id: agents::FRAUD_DETECTOR.into(),
            policy: Arc::new(Mutex::new(FraudPolicy::new())),
        };
        bus.register(agent.clone());
        info!(agent = %agent.id, "fraud agent initialized");
        agent
    }

    /// Score a transaction against the shared policy state.
    pub fn assess(&self, data: &TransactionData) -> RiskAssessment {
        self.policy.lock().assess(data, Utc::now())
    }

    fn on_check_request(&self, message: &Message, request: FraudCheckRequest) {
        let assessment = self.assess(&request.transaction_data);
        let is_fraudulent = assessment.is_fraudulent();
        info!(
            transaction_id = %request.transaction_id,
            risk_score = assessment.risk_score,
            is_fraudulent,
            "fraud check complete"
        );

        self.bus.send(
            &self.id,
            &message.sender,
            msg_type::FRAUD_CHECK_RESPONSE,
            ipc::to_payload(&FraudCheckResponse {
                transaction_id: request.transaction_id,
                is_fraudulent,
                risk_score: assessment.risk_score,
                fraud_indicators: assessment.indicators.clone(),
                reason: assessment.reason(),
            }),
            message.correlation_id,
        );

        if is_fraudulent {
            self.bus.send(
                &self.id,
                &agents::THREAT_DETECTOR.into(),
                msg_type::FRAUD_ALERT,
                ipc::to_payload(&FraudAlert {
                    transaction_id: request.transaction_id,
                    sender_account: request.transaction_data.sender_account,
                    risk_score: assessment.risk_score,
                    indicators: assessment.indicators,
                }),
                message.correlation_id,
            );
        }
    }
}

#[async_trait]
impl Participant for FraudAgent {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        match message.message_type.as_str() {
            msg_type::FRAUD_CHECK_REQUEST => {
                match ipc::from_payload::<FraudCheckRequest>(&message.payload) {
                    Ok(request) => self.on_check_request(&message, request),
                    Err(e) => warn!(error = %e, "malformed fraud_check_request dropped"),
                }
            }
            other => {
                debug!(message_type = other, "ignoring unknown message type");
            }
        }
    }
}
