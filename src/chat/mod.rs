//! Chat relay - stateless broadcast of chat messages

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::ws::protocol::{ChatServerMsg, ConnectionId};

const CHAT_CHANNEL_SIZE: usize = 256;

/// Fan-out hub for the chat namespace.
///
/// Every chat connection holds a receiver; anything sent reaches all of them,
/// the sender included.
#[derive(Clone)]
pub struct ChatRelay {
    tx: broadcast::Sender<ChatServerMsg>,
}

impl ChatRelay {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHAT_CHANNEL_SIZE);
        Self { tx }
    }

    /// Join the broadcast group
    pub fn subscribe(&self) -> broadcast::Receiver<ChatServerMsg> {
        self.tx.subscribe()
    }

    /// Rebroadcast a payload unchanged
    pub fn send_message(&self, data: Value) {
        self.publish(ChatServerMsg::ReceiveMessage(data));
    }

    /// Tell everyone a chat connection went away
    pub fn announce_departure(&self, connection_id: ConnectionId) {
        self.publish(ChatServerMsg::ReceiveMessage(Value::String(departure_notice(
            connection_id,
        ))));
    }

    /// Number of live chat connections
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }

    fn publish(&self, msg: ChatServerMsg) {
        // Err only means nobody is listening
        if let Ok(n) = self.tx.send(msg) {
            debug!(receivers = n, "Chat message relayed");
        }
    }
}

impl Default for ChatRelay {
    fn default() -> Self {
        Self::new()
    }
}

pub fn departure_notice(connection_id: ConnectionId) -> String {
    format!("{} disconnected", connection_id)
}
