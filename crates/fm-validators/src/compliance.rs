//! Compliance rule policy and agent.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::ipc::{
    self, msg_type, ComplianceCheckRequest, ComplianceCheckResponse, ComplianceViolation,
    RuleViolation, TransactionData,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest single transaction allowed without a violation.
const SINGLE_TRANSACTION_LIMIT: u32 = 25_000;
/// Largest per-sender total allowed in one calendar day.
const DAILY_LIMIT: u32 = 50_000;
/// Amount at which the sender must be KYC-verified.
const KYC_THRESHOLD: u32 = 5_000;
/// Account prefix marking a KYC-verified sender.
const VERIFIED_PREFIX: &str = "verified_";
/// Country codes no transfer may touch, matched as account substrings.
const PROHIBITED_COUNTRY_CODES: [&str; 2] = ["XX", "YY"];
/// Metadata keywords that flag a transaction for review.
const SUSPICIOUS_KEYWORDS: [&str; 3] = ["ransom", "illegal", "drugs"];

/// Outcome of checking one transaction.
#[derive(Debug, Clone)]
pub struct ComplianceResult {
    /// 1.0 minus the penalties of the violated rules, floored at 0.
    pub compliance_score: f64,
    /// The rules that were violated, empty when compliant.
    pub violations: Vec<RuleViolation>,
}

impl ComplianceResult {
    /// Compliant means no rule fired at all.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable verdict for the response payload.
    #[must_use]
    pub fn reason(&self) -> String {
        if self.is_compliant() {
            "All compliance checks passed".to_string()
        } else {
            let rules: Vec<&str> = self.violations.iter().map(|v| v.rule.as_str()).collect();
            format!("Rules violated: {}", rules.join(", "))
        }
    }
}

/// Stateful compliance policy.
///
/// Tracks per-sender running totals keyed by calendar day; totals only
/// advance for compliant transactions, so a rejected transfer does not eat
/// into the sender's daily allowance.
#[derive(Default)]
pub struct CompliancePolicy {
    daily_totals: HashMap<(String, NaiveDate), Decimal>,
}

impl CompliancePolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a transaction at the given instant.
    pub fn check(&mut self, data: &TransactionData, now: DateTime<Utc>) -> ComplianceResult {
        let mut violations = Vec::new();
        let mut penalty: f64 = 0.0;

        if data.amount > Decimal::from(SINGLE_TRANSACTION_LIMIT) {
            penalty += 0.5;
            violations.push(RuleViolation {
                rule: "single_transaction_limit".to_string(),
                description: format!(
                    "Amount {} exceeds the single-transaction limit of {SINGLE_TRANSACTION_LIMIT}",
                    data.amount
                ),
            });
        }

        let day_key = (data.sender_account.clone(), now.date_naive());
        let day_total = self.daily_totals.get(&day_key).copied().unwrap_or_default();
        if day_total + data.amount > Decimal::from(DAILY_LIMIT) {
            penalty += 0.4;
            violations.push(RuleViolation {
                rule: "daily_limit".to_string(),
                description: format!(
                    "Daily total {} would exceed the limit of {DAILY_LIMIT}",
                    day_total + data.amount
                ),
            });
        }

        if data.amount >= Decimal::from(KYC_THRESHOLD)
            && !data.sender_account.starts_with(VERIFIED_PREFIX)
        {
            penalty += 0.6;
            violations.push(RuleViolation {
                rule: "kyc_verification".to_string(),
                description: format!(
                    "Amounts of {KYC_THRESHOLD} and above require a verified sender account"
                ),
            });
        }

        let prohibited = PROHIBITED_COUNTRY_CODES.iter().any(|code| {
            data.sender_account.contains(code) || data.recipient_account.contains(code)
        });
        if prohibited {
            penalty += 0.8;
            violations.push(RuleViolation {
                rule: "prohibited_jurisdiction".to_string(),
                description: "Account is linked to a prohibited jurisdiction".to_string(),
            });
        }

        let keyword_hit = data.metadata.values().any(|value| {
            value.as_str().is_some_and(|text| {
                let text = text.to_lowercase();
                SUSPICIOUS_KEYWORDS.iter().any(|kw| text.contains(kw))
            })
        });
        if keyword_hit {
            penalty += 0.3;
            violations.push(RuleViolation {
                rule: "suspicious_description".to_string(),
                description: "Transaction metadata contains a flagged keyword".to_string(),
            });
        }

        let result = ComplianceResult {
            compliance_score: (1.0 - penalty).max(0.0),
            violations,
        };

        if result.is_compliant() {
            *self.daily_totals.entry(day_key).or_default() += data.amount;
        }
        result
    }
}

/// The compliance agent, registered on the bus as `compliance_agent`.
#[derive(Clone)]
pub struct ComplianceAgent {
    bus: Arc<MessageBus>,
    id: ParticipantId,
    policy: Arc<Mutex<CompliancePolicy>>,
}

impl ComplianceAgent {
    /// Create the agent and register it on the bus.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>) -> Self {
        let agent = Self {
            bus: bus.clone(),
            id: agents::COMPLIANCE_AGENT.into(),
            policy: Arc::new(Mutex::new(CompliancePolicy::new())),
        };
        bus.register(agent.clone());
        info!(agent = %agent.id, "compliance agent initialized");
        agent
    }

    /// Check a transaction against the shared policy state.
    pub fn check(&self, data: &TransactionData) -> ComplianceResult {
        self.policy.lock().check(data, Utc::now())
    }

    fn on_check_request(&self, message: &Message, request: ComplianceCheckRequest) {
        let result = self.check(&request.transaction_data);
        info!(
            transaction_id = %request.transaction_id,
            compliance_score = result.compliance_score,
            is_compliant = result.is_compliant(),
            "compliance check complete"
        );

        self.bus.send(
            &self.id,
            &message.sender,
            msg_type::COMPLIANCE_CHECK_RESPONSE,
            ipc::to_payload(&ComplianceCheckResponse {
                transaction_id: request.transaction_id,
                is_compliant: result.is_compliant(),
                compliance_score: result.compliance_score,
                violations: result.violations.clone(),
                reason: result.reason(),
            }),
            message.correlation_id,
        );

        if !result.is_compliant() {
            self.bus.send(
                &self.id,
                &agents::AUDIT_AGENT.into(),
                msg_type::COMPLIANCE_VIOLATION,
                ipc::to_payload(&ComplianceViolation {
                    transaction_id: request.transaction_id,
                    violations: result.violations,
                    sender_account: request.transaction_data.sender_account,
                    amount: request.transaction_data.amount,
                    timestamp: Utc::now(),
                }),
                message.correlation_id,
            );
        }
    }
}

#[async_trait]
impl Participant for ComplianceAgent {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        match message.message_type.as_str() {
            msg_type::COMPLIANCE_CHECK_REQUEST => {
                match ipc::from_payload::<ComplianceCheckRequest>(&message.payload) {
                    Ok(request) => self.on_check_request(&message, request),
                    Err(e) => warn!(error = %e, "malformed compliance_check_request dropped"),
                }
            }
            other => {
                debug!(message_type = other, "ignoring unknown message type");
            }
        }
    }
}
