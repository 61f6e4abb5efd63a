//! The message bus: participant directory, routing, and history.

use crate::message::{Message, ParticipantId};
use crate::participant::Participant;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};
use uuid::Uuid;

/// Directory state guarded by one lock.
///
/// Appending to history and enqueueing to the recipient's mailbox happen
/// under the same lock acquisition, which is what makes per-recipient
/// delivery order follow global send order.
struct Directory {
    participants: HashMap<ParticipantId, mpsc::UnboundedSender<Message>>,
    history: Vec<Message>,
}

/// In-process message bus.
///
/// Constructed explicitly and passed to every agent at construction time;
/// there is no ambient global instance. Each test builds its own isolated
/// bus.
pub struct MessageBus {
    directory: Mutex<Directory>,
    /// Messages enqueued to a mailbox whose handling has not finished yet.
    in_flight: AtomicUsize,
    idle: Notify,
}

impl MessageBus {
    /// Create an empty bus with no participants and no history.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            directory: Mutex::new(Directory {
                participants: HashMap::new(),
                history: Vec::new(),
            }),
            in_flight: AtomicUsize::new(0),
            idle: Notify::new(),
        })
    }

    /// Register a participant and spawn its mailbox task.
    ///
    /// Registering a second participant under the same id replaces the
    /// first; the displaced mailbox drains and its task exits.
    pub fn register<P: Participant>(self: &Arc<Self>, mut participant: P) {
        let id = participant.id();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        self.directory.lock().participants.insert(id.clone(), tx);
        debug!(participant = %id, "participant registered");

        // The task holds only a weak reference so dropping the bus closes
        // every mailbox and lets the tasks exit.
        let bus: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                participant.handle(message).await;
                if let Some(bus) = bus.upgrade() {
                    bus.delivery_done();
                }
            }
            debug!(participant = %id, "mailbox closed");
        });
    }

    /// Send a message from `sender` to `recipient`.
    ///
    /// The message is always appended to history. It is enqueued to the
    /// recipient's mailbox only if the recipient is registered; otherwise it
    /// is recorded but not delivered.
    pub fn send(
        &self,
        sender: &ParticipantId,
        recipient: &ParticipantId,
        message_type: &str,
        payload: Value,
        correlation_id: Option<Uuid>,
    ) -> Message {
        let message = Message::new(
            sender.clone(),
            recipient.clone(),
            message_type,
            payload,
            correlation_id,
        );

        let mut directory = self.directory.lock();
        directory.history.push(message.clone());

        match directory.participants.get(recipient) {
            Some(mailbox) => {
                self.in_flight.fetch_add(1, Ordering::AcqRel);
                if mailbox.send(message.clone()).is_err() {
                    // Mailbox task gone; treat like an unregistered recipient.
                    self.delivery_done();
                    warn!(
                        recipient = %recipient,
                        message_type,
                        "mailbox closed, message recorded but not delivered"
                    );
                }
            }
            None => {
                debug!(
                    recipient = %recipient,
                    message_type,
                    "recipient not registered, message recorded but not delivered"
                );
            }
        }
        drop(directory);

        message
    }

    /// Send to every registered participant except `sender`.
    ///
    /// Delivery order across recipients is unspecified; history preserves
    /// the send order used here.
    pub fn broadcast(
        &self,
        sender: &ParticipantId,
        message_type: &str,
        payload: Value,
        correlation_id: Option<Uuid>,
    ) -> Vec<Message> {
        let mut recipients: Vec<ParticipantId> = {
            let directory = self.directory.lock();
            directory
                .participants
                .keys()
                .filter(|id| *id != sender)
                .cloned()
                .collect()
        };
        recipients.sort();

        recipients
            .iter()
            .map(|recipient| {
                self.send(sender, recipient, message_type, payload.clone(), correlation_id)
            })
            .collect()
    }

    /// Snapshot of the message history, in global send order.
    ///
    /// With a filter, only messages sent or received by that participant are
    /// returned.
    #[must_use]
    pub fn history(&self, participant: Option<&ParticipantId>) -> Vec<Message> {
        let directory = self.directory.lock();
        match participant {
            Some(p) => directory
                .history
                .iter()
                .filter(|m| m.involves(p))
                .cloned()
                .collect(),
            None => directory.history.clone(),
        }
    }

    /// Whether a participant id is currently registered.
    #[must_use]
    pub fn is_registered(&self, participant: &ParticipantId) -> bool {
        self.directory.lock().participants.contains_key(participant)
    }

    /// Number of delivered messages whose handling has not finished.
    #[must_use]
    pub fn pending_deliveries(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Wait until every delivered message, including cascades it triggered,
    /// has been fully handled.
    ///
    /// This is the observation barrier: after `settle` returns, all effects
    /// of previously sent messages are visible. New sends started after the
    /// call may of course make the bus busy again.
    pub async fn settle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }

    fn delivery_done(&self) {
        if self.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }
}
