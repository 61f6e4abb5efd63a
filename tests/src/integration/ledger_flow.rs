//! # Ledger Flow Scenarios
//!
//! Record, mine, and verify over the bus. The requester is not itself
//! registered, so responses land in history only; assertions read them
//! from there.

#[cfg(test)]
use fm_ledger::{DIFFICULTY, MAX_BLOCK_TRANSACTIONS};
#[cfg(test)]
use rust_decimal_macros::dec;
#[cfg(test)]
use serde_json::json;
#[cfg(test)]
use shared_bus::Message;
#[cfg(test)]
use shared_types::agents;
#[cfg(test)]
use shared_types::entities::TransactionStatus;
#[cfg(test)]
use shared_types::ipc::{self, msg_type, LedgerRecordRequest, LedgerTxData, LedgerVerifyRequest};
#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
use super::Pipeline;

#[cfg(test)]
fn record_request(pipeline: &Pipeline, transaction_id: Uuid, amount: rust_decimal::Decimal) {
    pipeline.bus.send(
        &"treasury_ops".into(),
        &agents::BLOCKCHAIN_AGENT.into(),
        msg_type::BLOCKCHAIN_RECORD_REQUEST,
        ipc::to_payload(&LedgerRecordRequest {
            transaction_data: LedgerTxData {
                transaction_id,
                amount,
                sender_account: "verified_user_001".to_string(),
                recipient_account: "merchant_account_123".to_string(),
            },
        }),
        Some(transaction_id),
    );
}

#[cfg(test)]
fn mine_request(pipeline: &Pipeline) {
    pipeline.bus.send(
        &"treasury_ops".into(),
        &agents::BLOCKCHAIN_AGENT.into(),
        msg_type::MINE_BLOCK_REQUEST,
        json!({}),
        None,
    );
}

#[cfg(test)]
fn verify_request(pipeline: &Pipeline, transaction_id: Uuid) {
    pipeline.bus.send(
        &"treasury_ops".into(),
        &agents::BLOCKCHAIN_AGENT.into(),
        msg_type::BLOCKCHAIN_VERIFY_REQUEST,
        ipc::to_payload(&LedgerVerifyRequest { transaction_id }),
        Some(transaction_id),
    );
}

#[cfg(test)]
fn messages_of_type(pipeline: &Pipeline, message_type: &str) -> Vec<Message> {
    pipeline
        .bus
        .history(None)
        .into_iter()
        .filter(|m| m.message_type == message_type)
        .collect()
}

#[tokio::test]
async fn test_batching_splits_twelve_transactions_across_two_blocks() {
    let pipeline = Pipeline::start();

    for _ in 0..12 {
        record_request(&pipeline, Uuid::new_v4(), dec!(250));
    }
    mine_request(&pipeline);
    pipeline.bus.settle().await;

    let mined = messages_of_type(&pipeline, msg_type::BLOCK_MINED);
    assert_eq!(mined.len(), 1);
    assert_eq!(
        mined[0].payload["transaction_count"],
        json!(MAX_BLOCK_TRANSACTIONS)
    );
    assert_eq!(mined[0].payload["block_index"], json!(1));

    mine_request(&pipeline);
    pipeline.bus.settle().await;

    let mined = messages_of_type(&pipeline, msg_type::BLOCK_MINED);
    assert_eq!(mined.len(), 2);
    assert_eq!(mined[1].payload["transaction_count"], json!(2));
    assert_eq!(mined[1].payload["block_index"], json!(2));

    let status = pipeline.ledger.status();
    assert_eq!(status.pending_transactions, 0);
    assert_eq!(status.confirmed_transactions, 12);
    // Genesis plus two mined blocks.
    assert_eq!(status.chain_length, 3);
    assert!(pipeline.ledger.validate().is_ok());
}

#[tokio::test]
async fn test_verify_transitions_from_pending_to_confirmed() {
    let pipeline = Pipeline::start();
    let transaction_id = Uuid::new_v4();

    record_request(&pipeline, transaction_id, dec!(99));
    verify_request(&pipeline, transaction_id);
    pipeline.bus.settle().await;

    let responses = messages_of_type(&pipeline, msg_type::BLOCKCHAIN_VERIFY_RESPONSE);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].payload["status"], json!("pending"));
    assert_eq!(responses[0].payload["queue_position"], json!(1));

    mine_request(&pipeline);
    verify_request(&pipeline, transaction_id);
    pipeline.bus.settle().await;

    let responses = messages_of_type(&pipeline, msg_type::BLOCKCHAIN_VERIFY_RESPONSE);
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[1].payload["status"], json!("confirmed"));
    assert_eq!(responses[1].payload["verified"], json!(true));
    assert_eq!(responses[1].payload["block_index"], json!(1));
    assert_eq!(responses[1].payload["confirmations"], json!(1));
    let block_hash = responses[1].payload["block_hash"].as_str().unwrap();
    assert!(block_hash.starts_with(&"0".repeat(DIFFICULTY)));
}

#[tokio::test]
async fn test_completed_transaction_is_recorded_on_the_ledger() {
    let pipeline = Pipeline::start();

    let tx = pipeline
        .submit(dec!(1500), "verified_user_001", "merchant_account_123")
        .await;
    assert_eq!(
        pipeline.coordinator.status(tx.id).unwrap().status,
        TransactionStatus::Completed
    );

    record_request(&pipeline, tx.id, tx.amount);
    mine_request(&pipeline);
    verify_request(&pipeline, tx.id);
    pipeline.bus.settle().await;

    let responses = messages_of_type(&pipeline, msg_type::BLOCKCHAIN_VERIFY_RESPONSE);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].payload["status"], json!("confirmed"));
    assert_eq!(responses[0].correlation_id, Some(tx.id));

    // The record response echoed the saga transaction id.
    let records = messages_of_type(&pipeline, msg_type::BLOCKCHAIN_RECORD_RESPONSE);
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].payload["transaction_id"],
        json!(tx.id.to_string())
    );
}

#[tokio::test]
async fn test_unknown_transaction_verifies_as_not_found() {
    let pipeline = Pipeline::start();

    verify_request(&pipeline, Uuid::new_v4());
    pipeline.bus.settle().await;

    let responses = messages_of_type(&pipeline, msg_type::BLOCKCHAIN_VERIFY_RESPONSE);
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].payload["status"], json!("not_found"));
    assert_eq!(responses[0].payload["verified"], json!(false));
    assert!(responses[0].payload.get("queue_position").is_none());
}
