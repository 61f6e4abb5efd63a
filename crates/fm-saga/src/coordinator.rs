//! Transaction-processing agent.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::entities::{Transaction, TransactionStatus, FAILURE_REASON_KEY};
use shared_types::ipc::{
    self, msg_type, ComplianceCheckRequest, ComplianceCheckResponse, Complexity,
    FraudCheckRequest, FraudCheckResponse, Priority, ResourceAllocated, ResourceRequest,
    TransactionCompleted, TransactionData, TransactionFailed,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Lifecycle sets, mutually exclusive by construction: a transaction id
/// lives in exactly one of them at any time.
#[derive(Default)]
struct LifecycleState {
    pending: HashMap<Uuid, Transaction>,
    completed: HashMap<Uuid, Transaction>,
    failed: HashMap<Uuid, Transaction>,
}

/// The saga coordinator, registered on the bus as `transaction_processor`.
///
/// Cloning is cheap and shares state; the clone driven by the bus mailbox
/// and the clone held by the caller observe the same lifecycle maps.
#[derive(Clone)]
pub struct SagaCoordinator {
    bus: Arc<MessageBus>,
    id: ParticipantId,
    state: Arc<Mutex<LifecycleState>>,
}

impl SagaCoordinator {
    /// Create the coordinator and register it on the bus.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>) -> Self {
        let coordinator = Self {
            bus: bus.clone(),
            id: agents::TRANSACTION_PROCESSOR.into(),
            state: Arc::new(Mutex::new(LifecycleState::default())),
        };
        bus.register(coordinator.clone());
        info!(agent = %coordinator.id, "saga coordinator initialized");
        coordinator
    }

    /// Create a new pending transaction and store it in the pending set.
    pub fn create_transaction(
        &self,
        amount: Decimal,
        sender_account: impl Into<String>,
        recipient_account: impl Into<String>,
        currency: impl Into<String>,
        metadata: Option<Map<String, Value>>,
    ) -> Transaction {
        let tx = Transaction::new(amount, sender_account, recipient_account, currency, metadata);
        self.state.lock().pending.insert(tx.id, tx.clone());
        info!(
            transaction_id = %tx.id,
            amount = %tx.amount,
            currency = %tx.currency,
            sender = %tx.sender_account,
            recipient = %tx.recipient_account,
            "transaction created"
        );
        tx
    }

    /// Fan a transaction out to the three validators.
    ///
    /// Fire-and-forget: all three requests share `correlation_id = tx.id`
    /// and the coordinator reacts to responses in whatever order they
    /// arrive.
    pub fn process_transaction(&self, tx: &Transaction) {
        info!(transaction_id = %tx.id, "processing transaction");
        let data = TransactionData {
            amount: tx.amount,
            sender_account: tx.sender_account.clone(),
            recipient_account: tx.recipient_account.clone(),
            currency: tx.currency.clone(),
            metadata: tx.metadata.clone(),
        };

        self.bus.send(
            &self.id,
            &agents::FRAUD_DETECTOR.into(),
            msg_type::FRAUD_CHECK_REQUEST,
            ipc::to_payload(&FraudCheckRequest {
                transaction_id: tx.id,
                transaction_data: data.clone(),
            }),
            Some(tx.id),
        );
        self.bus.send(
            &self.id,
            &agents::COMPLIANCE_AGENT.into(),
            msg_type::COMPLIANCE_CHECK_REQUEST,
            ipc::to_payload(&ComplianceCheckRequest {
                transaction_id: tx.id,
                transaction_data: data,
            }),
            Some(tx.id),
        );
        self.bus.send(
            &self.id,
            &agents::RESOURCE_ALLOCATOR.into(),
            msg_type::RESOURCE_REQUEST,
            ipc::to_payload(&ResourceRequest {
                transaction_id: tx.id,
                processing_priority: Priority::Normal,
                estimated_complexity: Complexity::Low,
            }),
            Some(tx.id),
        );
    }

    /// Move a pending transaction to the completed set and notify audit.
    ///
    /// Returns false when the id is not pending, which makes repeated calls
    /// (and late failure attempts against a completed transaction) no-ops.
    pub fn complete_transaction(&self, transaction_id: Uuid) -> bool {
        let completed = {
            let mut state = self.state.lock();
            let Some(mut tx) = state.pending.remove(&transaction_id) else {
                return false;
            };
            tx.status = TransactionStatus::Completed;
            state.completed.insert(transaction_id, tx.clone());
            tx
        };

        info!(transaction_id = %transaction_id, "transaction completed");
        self.bus.send(
            &self.id,
            &agents::AUDIT_AGENT.into(),
            msg_type::TRANSACTION_COMPLETED,
            ipc::to_payload(&TransactionCompleted {
                transaction_id,
                amount: completed.amount,
                timestamp: completed.timestamp,
            }),
            None,
        );
        true
    }

    /// Move a pending transaction to the failed set, record the reason in
    /// its metadata, and notify audit.
    ///
    /// Returns false when the id is not pending.
    pub fn fail_transaction(&self, transaction_id: Uuid, reason: &str) -> bool {
        {
            let mut state = self.state.lock();
            let Some(mut tx) = state.pending.remove(&transaction_id) else {
                return false;
            };
            tx.status = TransactionStatus::Failed;
            tx.metadata.insert(
                FAILURE_REASON_KEY.to_string(),
                Value::String(reason.to_string()),
            );
            state.failed.insert(transaction_id, tx);
        }

        error!(transaction_id = %transaction_id, reason, "transaction failed");
        self.bus.send(
            &self.id,
            &agents::AUDIT_AGENT.into(),
            msg_type::TRANSACTION_FAILED,
            ipc::to_payload(&TransactionFailed {
                transaction_id,
                reason: reason.to_string(),
                timestamp: Utc::now(),
            }),
            None,
        );
        true
    }

    /// Snapshot of a transaction, wherever it is in the lifecycle.
    ///
    /// None means the id is unknown to the coordinator.
    #[must_use]
    pub fn status(&self, transaction_id: Uuid) -> Option<Transaction> {
        let state = self.state.lock();
        state
            .pending
            .get(&transaction_id)
            .or_else(|| state.completed.get(&transaction_id))
            .or_else(|| state.failed.get(&transaction_id))
            .cloned()
    }

    /// Counts of (pending, completed, failed) transactions.
    #[must_use]
    pub fn lifecycle_counts(&self) -> (usize, usize, usize) {
        let state = self.state.lock();
        (state.pending.len(), state.completed.len(), state.failed.len())
    }

    fn on_fraud_response(&self, response: FraudCheckResponse) {
        if response.is_fraudulent {
            self.fail_transaction(
                response.transaction_id,
                &format!("Fraud detected: {}", response.reason),
            );
        } else {
            info!(
                transaction_id = %response.transaction_id,
                risk_score = response.risk_score,
                "transaction passed fraud check"
            );
        }
    }

    fn on_compliance_response(&self, response: ComplianceCheckResponse) {
        if response.is_compliant {
            info!(
                transaction_id = %response.transaction_id,
                "transaction passed compliance check"
            );
        } else {
            self.fail_transaction(
                response.transaction_id,
                &format!("Compliance violation: {}", response.reason),
            );
        }
    }

    fn on_resource_allocated(&self, response: ResourceAllocated) {
        info!(
            transaction_id = %response.transaction_id,
            "resources allocated"
        );
        // Resource allocation is the final gate: complete immediately, even
        // if fraud/compliance responses are still outstanding. A later
        // failure response finds the transaction no longer pending and is
        // ignored.
        self.complete_transaction(response.transaction_id);
    }
}

#[async_trait]
impl Participant for SagaCoordinator {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        match message.message_type.as_str() {
            msg_type::FRAUD_CHECK_RESPONSE => {
                match ipc::from_payload::<FraudCheckResponse>(&message.payload) {
                    Ok(response) => self.on_fraud_response(response),
                    Err(e) => warn!(error = %e, "malformed fraud_check_response dropped"),
                }
            }
            msg_type::COMPLIANCE_CHECK_RESPONSE => {
                match ipc::from_payload::<ComplianceCheckResponse>(&message.payload) {
                    Ok(response) => self.on_compliance_response(response),
                    Err(e) => warn!(error = %e, "malformed compliance_check_response dropped"),
                }
            }
            msg_type::RESOURCE_ALLOCATED => {
                match ipc::from_payload::<ResourceAllocated>(&message.payload) {
                    Ok(response) => self.on_resource_allocated(response),
                    Err(e) => warn!(error = %e, "malformed resource_allocated dropped"),
                }
            }
            msg_type::RESOURCE_ALLOCATION_FAILED => {
                // Not a terminal outcome: absence of a success response is
                // "no decision yet", so the transaction stays pending.
                debug!(
                    correlation_id = ?message.correlation_id,
                    "resource allocation failed, transaction remains pending"
                );
            }
            other => {
                debug!(message_type = other, "ignoring unknown message type");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn coordinator() -> (Arc<MessageBus>, SagaCoordinator) {
        let bus = MessageBus::new();
        let coordinator = SagaCoordinator::new(bus.clone());
        (bus, coordinator)
    }

    fn fraud_response(bus: &MessageBus, id: Uuid, fraudulent: bool, reason: &str) {
        bus.send(
            &agents::FRAUD_DETECTOR.into(),
            &agents::TRANSACTION_PROCESSOR.into(),
            msg_type::FRAUD_CHECK_RESPONSE,
            ipc::to_payload(&FraudCheckResponse {
                transaction_id: id,
                is_fraudulent: fraudulent,
                risk_score: if fraudulent { 0.9 } else { 0.1 },
                fraud_indicators: vec![],
                reason: reason.to_string(),
            }),
            Some(id),
        );
    }

    fn resource_allocated(bus: &MessageBus, id: Uuid) {
        bus.send(
            &agents::RESOURCE_ALLOCATOR.into(),
            &agents::TRANSACTION_PROCESSOR.into(),
            msg_type::RESOURCE_ALLOCATED,
            ipc::to_payload(&ResourceAllocated {
                transaction_id: id,
                allocated: true,
                granted: Default::default(),
            }),
            Some(id),
        );
    }

    #[tokio::test]
    async fn test_initial_state_empty() {
        let (_bus, coordinator) = coordinator();
        assert_eq!(coordinator.lifecycle_counts(), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_create_transaction_is_pending() {
        let (_bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(1000), "s", "r", "USD", None);
        assert_eq!(tx.status, TransactionStatus::Pending);
        assert_eq!(coordinator.lifecycle_counts(), (1, 0, 0));
        let snapshot = coordinator.status(tx.id).unwrap();
        assert_eq!(snapshot.amount, dec!(1000));
    }

    #[tokio::test]
    async fn test_fan_out_sends_three_correlated_requests() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(500), "s", "r", "USD", None);
        coordinator.process_transaction(&tx);
        bus.settle().await;

        let requests: Vec<Message> = bus
            .history(None)
            .into_iter()
            .filter(|m| m.sender.as_str() == agents::TRANSACTION_PROCESSOR)
            .collect();
        assert_eq!(requests.len(), 3);
        let types: Vec<&str> = requests.iter().map(|m| m.message_type.as_str()).collect();
        assert!(types.contains(&msg_type::FRAUD_CHECK_REQUEST));
        assert!(types.contains(&msg_type::COMPLIANCE_CHECK_REQUEST));
        assert!(types.contains(&msg_type::RESOURCE_REQUEST));
        for request in &requests {
            assert_eq!(request.correlation_id, Some(tx.id));
        }
    }

    #[tokio::test]
    async fn test_complete_moves_to_completed_and_is_idempotent() {
        let (_bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        assert!(coordinator.complete_transaction(tx.id));
        assert_eq!(coordinator.lifecycle_counts(), (0, 1, 0));
        assert_eq!(
            coordinator.status(tx.id).unwrap().status,
            TransactionStatus::Completed
        );

        // Repeat completion and late failure are both no-ops.
        assert!(!coordinator.complete_transaction(tx.id));
        assert!(!coordinator.fail_transaction(tx.id, "too late"));
        assert_eq!(
            coordinator.status(tx.id).unwrap().status,
            TransactionStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_fail_records_reason() {
        let (_bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        assert!(coordinator.fail_transaction(tx.id, "Insufficient funds"));
        let failed = coordinator.status(tx.id).unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert_eq!(failed.failure_reason(), Some("Insufficient funds"));
        assert!(!coordinator.complete_transaction(tx.id));
    }

    #[tokio::test]
    async fn test_status_not_found() {
        let (_bus, coordinator) = coordinator();
        assert!(coordinator.status(Uuid::new_v4()).is_none());
    }

    #[tokio::test]
    async fn test_clean_fraud_response_leaves_pending() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        fraud_response(&bus, tx.id, false, "No fraud indicators detected");
        bus.settle().await;

        assert_eq!(
            coordinator.status(tx.id).unwrap().status,
            TransactionStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_fraudulent_response_fails_transaction() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        fraud_response(&bus, tx.id, true, "High risk indicators detected");
        bus.settle().await;

        let failed = coordinator.status(tx.id).unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert!(failed
            .failure_reason()
            .unwrap()
            .starts_with("Fraud detected:"));
    }

    #[tokio::test]
    async fn test_non_compliant_response_fails_transaction() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        bus.send(
            &agents::COMPLIANCE_AGENT.into(),
            &agents::TRANSACTION_PROCESSOR.into(),
            msg_type::COMPLIANCE_CHECK_RESPONSE,
            ipc::to_payload(&ComplianceCheckResponse {
                transaction_id: tx.id,
                is_compliant: false,
                compliance_score: 0.3,
                violations: vec![],
                reason: "Exceeds daily limit".to_string(),
            }),
            Some(tx.id),
        );
        bus.settle().await;

        let failed = coordinator.status(tx.id).unwrap();
        assert_eq!(failed.status, TransactionStatus::Failed);
        assert!(failed
            .failure_reason()
            .unwrap()
            .contains("Compliance violation"));
    }

    #[tokio::test]
    async fn test_resource_allocation_completes_transaction() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        resource_allocated(&bus, tx.id);
        bus.settle().await;

        assert_eq!(
            coordinator.status(tx.id).unwrap().status,
            TransactionStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_resource_allocation_wins_race_over_late_fraud_failure() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        // Resource response lands first; the later fraud failure must be a
        // no-op. This ordering-dependent behavior is contractual.
        resource_allocated(&bus, tx.id);
        bus.settle().await;
        fraud_response(&bus, tx.id, true, "round trip pattern");
        bus.settle().await;

        let snapshot = coordinator.status(tx.id).unwrap();
        assert_eq!(snapshot.status, TransactionStatus::Completed);
        assert!(snapshot.failure_reason().is_none());

        // Exactly one audit event: the completion. No failure event.
        let audit: Vec<Message> = bus.history(Some(&agents::AUDIT_AGENT.into()));
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].message_type, msg_type::TRANSACTION_COMPLETED);
    }

    #[tokio::test]
    async fn test_allocation_failure_leaves_transaction_pending() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        bus.send(
            &agents::RESOURCE_ALLOCATOR.into(),
            &agents::TRANSACTION_PROCESSOR.into(),
            msg_type::RESOURCE_ALLOCATION_FAILED,
            serde_json::json!({ "transaction_id": tx.id, "allocated": false }),
            Some(tx.id),
        );
        bus.settle().await;

        assert_eq!(
            coordinator.status(tx.id).unwrap().status,
            TransactionStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_unknown_message_type_ignored() {
        let (bus, coordinator) = coordinator();
        let tx = coordinator.create_transaction(dec!(100), "s", "r", "USD", None);

        bus.send(
            &"unknown_agent".into(),
            &agents::TRANSACTION_PROCESSOR.into(),
            "unknown_message",
            serde_json::json!({ "data": "test" }),
            None,
        );
        bus.settle().await;

        assert_eq!(
            coordinator.status(tx.id).unwrap().status,
            TransactionStatus::Pending
        );
    }
}
