//! # Integration Scenarios
//!
//! Cross-agent choreography over one shared bus:
//!
//! ```text
//! [SagaCoordinator] ──fraud_check_request───────→ [FraudAgent]
//!        │          ──compliance_check_request──→ [ComplianceAgent]
//!        │          ──resource_request──────────→ [ResourceAgent]
//!        │                                             │
//!        ←──────────── responses (correlation = tx id) ┘
//!        │
//!        └──transaction_completed / transaction_failed──→ [AuditAgent]
//!
//! [any] ──blockchain_record_request / mine_block_request──→ [LedgerAgent]
//! ```
//!
//! Every test builds a fresh [`Pipeline`] so scenarios are fully isolated.

pub mod ledger_flow;
pub mod pipeline;

use fm_audit::AuditAgent;
use fm_ledger::LedgerAgent;
use fm_saga::SagaCoordinator;
use fm_validators::{ComplianceAgent, FraudAgent, ResourceAgent, ThreatAgent};
use rust_decimal::Decimal;
use shared_bus::MessageBus;
use shared_types::entities::Transaction;
use std::sync::Arc;

/// The agent mesh wired onto one bus.
pub struct Pipeline {
    pub bus: Arc<MessageBus>,
    pub coordinator: SagaCoordinator,
    pub fraud: FraudAgent,
    pub compliance: ComplianceAgent,
    pub resources: Option<ResourceAgent>,
    pub threat: ThreatAgent,
    pub audit: AuditAgent,
    pub ledger: LedgerAgent,
}

impl Pipeline {
    /// Register every agent on a fresh bus.
    pub fn start() -> Self {
        Self::wire(true)
    }

    /// Mesh without the resource allocator registered.
    ///
    /// The coordinator's resource request becomes a recorded routing miss,
    /// so the fan-in outcome is decided by the fraud and compliance verdicts
    /// alone. With the allocator wired, its grant races the verdicts and can
    /// complete the transaction before a failure verdict lands.
    pub fn start_without_allocator() -> Self {
        Self::wire(false)
    }

    fn wire(with_allocator: bool) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let bus = MessageBus::new();
        Self {
            coordinator: SagaCoordinator::new(bus.clone()),
            fraud: FraudAgent::new(bus.clone()),
            compliance: ComplianceAgent::new(bus.clone()),
            resources: with_allocator.then(|| ResourceAgent::new(bus.clone())),
            threat: ThreatAgent::new(bus.clone()),
            audit: AuditAgent::new(&bus),
            ledger: LedgerAgent::new(bus.clone()),
            bus,
        }
    }

    /// Create a transaction, fan it out, and wait for the bus to go quiet.
    pub async fn submit(&self, amount: Decimal, sender: &str, recipient: &str) -> Transaction {
        let tx = self
            .coordinator
            .create_transaction(amount, sender, recipient, "USD", None);
        self.coordinator.process_transaction(&tx);
        self.bus.settle().await;
        tx
    }
}
