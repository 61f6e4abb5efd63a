//! Participant capability trait.

use crate::message::{Message, ParticipantId};
use async_trait::async_trait;

/// Anything that can receive and react to a [`Message`].
///
/// A participant is registered once on the bus, which spawns a mailbox task
/// that calls [`handle`](Participant::handle) for each delivered message in
/// send order. Handlers are free to send further messages through the bus
/// (cascading delivery); termination comes from the natural end of each
/// message flow, not from a depth limit.
///
/// Dispatch on `message.message_type` happens inside the implementation:
/// unknown types are ignored, malformed payloads are logged and dropped.
#[async_trait]
pub trait Participant: Send + 'static {
    /// Identifier under which this participant is registered.
    fn id(&self) -> ParticipantId;

    /// React to one delivered message.
    async fn handle(&mut self, message: Message);
}
