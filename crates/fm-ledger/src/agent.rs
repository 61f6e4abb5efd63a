//! Bus-facing ledger participant.

use crate::ledger::{Ledger, LedgerStatus, LedgerTransaction, Verification};
use crate::block::Block;
use crate::error::ChainError;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::ipc::{
    self, msg_type, BlockMined, LedgerRecordRequest, LedgerRecordResponse, LedgerTxData,
    LedgerVerifyRequest, LedgerVerifyResponse,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The ledger agent, registered on the bus as `blockchain_agent`.
///
/// Owns the [`Ledger`] behind a single lock; all mutation flows through this
/// agent, which keeps the chain tip and pending queue under single-writer
/// discipline. Mining runs inline in the handler, which blocks only this
/// agent's own mailbox; other participants keep receiving messages while
/// the nonce search runs.
#[derive(Clone)]
pub struct LedgerAgent {
    bus: Arc<MessageBus>,
    id: ParticipantId,
    ledger: Arc<Mutex<Ledger>>,
}

impl LedgerAgent {
    /// Create the agent (mining the genesis block) and register it.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>) -> Self {
        let agent = Self {
            bus: bus.clone(),
            id: agents::BLOCKCHAIN_AGENT.into(),
            ledger: Arc::new(Mutex::new(Ledger::new())),
        };
        bus.register(agent.clone());
        info!(agent = %agent.id, "ledger agent initialized");
        agent
    }

    /// Queue a transaction for recording. See [`Ledger::submit`].
    pub fn submit(&self, data: &LedgerTxData) -> LedgerTransaction {
        self.ledger.lock().submit(data)
    }

    /// Mine the next block, if anything is pending. See [`Ledger::mine`].
    pub fn mine(&self) -> Option<Block> {
        self.ledger.lock().mine()
    }

    /// Look a transaction up on the chain. See [`Ledger::verify`].
    #[must_use]
    pub fn verify(&self, transaction_id: Uuid) -> Verification {
        self.ledger.lock().verify(transaction_id)
    }

    /// Validate chain integrity. See [`Ledger::validate`].
    pub fn validate(&self) -> Result<(), ChainError> {
        self.ledger.lock().validate()
    }

    /// Summary snapshot. See [`Ledger::status`].
    #[must_use]
    pub fn status(&self) -> LedgerStatus {
        self.ledger.lock().status()
    }

    fn on_record_request(&self, message: &Message, request: LedgerRecordRequest) {
        info!(
            transaction_id = %request.transaction_data.transaction_id,
            "recording transaction on ledger"
        );
        let ledger_tx = self.submit(&request.transaction_data);
        self.bus.send(
            &self.id,
            &message.sender,
            msg_type::BLOCKCHAIN_RECORD_RESPONSE,
            ipc::to_payload(&LedgerRecordResponse {
                transaction_id: request.transaction_data.transaction_id,
                ledger_tx_id: ledger_tx.id,
                status: "pending".to_string(),
                message: "Transaction queued for ledger recording".to_string(),
            }),
            message.correlation_id,
        );
    }

    fn on_verify_request(&self, message: &Message, request: LedgerVerifyRequest) {
        let response = match self.verify(request.transaction_id) {
            Verification::Confirmed {
                ledger_tx_id,
                block_index,
                block_hash,
                confirmations,
            } => LedgerVerifyResponse {
                transaction_id: request.transaction_id,
                verified: true,
                status: "confirmed".to_string(),
                ledger_tx_id: Some(ledger_tx_id),
                block_index: Some(block_index),
                block_hash: Some(block_hash),
                confirmations: Some(confirmations),
                queue_position: None,
            },
            Verification::Pending {
                ledger_tx_id,
                queue_position,
            } => LedgerVerifyResponse {
                transaction_id: request.transaction_id,
                verified: true,
                status: "pending".to_string(),
                ledger_tx_id: Some(ledger_tx_id),
                block_index: None,
                block_hash: None,
                confirmations: None,
                queue_position: Some(queue_position),
            },
            Verification::NotFound => LedgerVerifyResponse {
                transaction_id: request.transaction_id,
                verified: false,
                status: "not_found".to_string(),
                ledger_tx_id: None,
                block_index: None,
                block_hash: None,
                confirmations: None,
                queue_position: None,
            },
        };

        self.bus.send(
            &self.id,
            &message.sender,
            msg_type::BLOCKCHAIN_VERIFY_RESPONSE,
            ipc::to_payload(&response),
            message.correlation_id,
        );
    }

    fn on_mine_request(&self, message: &Message) {
        if let Some(block) = self.mine() {
            self.bus.send(
                &self.id,
                &message.sender,
                msg_type::BLOCK_MINED,
                ipc::to_payload(&BlockMined {
                    block_index: block.index,
                    block_hash: block.hash.clone(),
                    transaction_count: block.transactions.len(),
                }),
                message.correlation_id,
            );
        }
    }
}

#[async_trait]
impl Participant for LedgerAgent {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        match message.message_type.as_str() {
            msg_type::BLOCKCHAIN_RECORD_REQUEST => {
                match ipc::from_payload::<LedgerRecordRequest>(&message.payload) {
                    Ok(request) => self.on_record_request(&message, request),
                    Err(e) => warn!(error = %e, "malformed blockchain_record_request dropped"),
                }
            }
            msg_type::BLOCKCHAIN_VERIFY_REQUEST => {
                match ipc::from_payload::<LedgerVerifyRequest>(&message.payload) {
                    Ok(request) => self.on_verify_request(&message, request),
                    Err(e) => warn!(error = %e, "malformed blockchain_verify_request dropped"),
                }
            }
            msg_type::MINE_BLOCK_REQUEST => self.on_mine_request(&message),
            other => {
                debug!(message_type = other, "ignoring unknown message type");
            }
        }
    }
}
