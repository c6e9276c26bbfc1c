use std::collections::HashMap;
use std::sync::Arc;

use system::{ConnectionId, ServerMessage};
use tokio::sync::mpsc::error::TrySendError;

/// A serialized outbound message, shared by every recipient of a broadcast.
pub type Payload = Arc<str>;

pub type ConnectionTx = tokio::sync::mpsc::Sender<Payload>;

/// Open connections, keyed by id.
///
/// Delivery never waits: a closed or saturated outbox only costs that one
/// recipient its copy of the message.
pub struct ConnectionRegistry {
    connection_txs: HashMap<ConnectionId, ConnectionTx>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connection_txs: HashMap::new(),
        }
    }

    pub fn register(&mut self, connection_id: ConnectionId, tx: ConnectionTx) {
        if self.connection_txs.insert(connection_id, tx).is_some() {
            log::warn!("Connection {} registered twice", connection_id);
        }
    }

    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<ConnectionTx> {
        self.connection_txs.remove(connection_id)
    }

    pub fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.connection_txs.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connection_txs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connection_txs.is_empty()
    }

    pub fn send(&self, to: &ConnectionId, message: &ServerMessage) -> bool {
        match self.connection_txs.get(to) {
            Some(tx) => match serialize(message) {
                Some(payload) => deliver(to, tx, &payload),
                None => false,
            },
            None => {
                log::debug!("Dropping message for unknown connection {}", to);
                false
            }
        }
    }

    /// Returns how many connections accepted the message.
    pub fn broadcast(&self, message: &ServerMessage, excluding: Option<&ConnectionId>) -> usize {
        let payload = match serialize(message) {
            Some(payload) => payload,
            None => return 0,
        };
        self.connection_txs
            .iter()
            .filter(|(connection_id, _)| excluding != Some(*connection_id))
            .filter(|(connection_id, tx)| deliver(connection_id, tx, &payload))
            .count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(message: &ServerMessage) -> Option<Payload> {
    match message.to_json() {
        Ok(json) => Some(Arc::from(json)),
        Err(err) => {
            log::warn!("Failed to serialize {:?}: {}", message, err);
            None
        }
    }
}

fn deliver(connection_id: &ConnectionId, tx: &ConnectionTx, payload: &Payload) -> bool {
    if tx.is_closed() {
        return false;
    }
    match tx.try_send(payload.clone()) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            log::warn!("Outbox of connection {} is full, message dropped", connection_id);
            false
        }
        Err(TrySendError::Closed(_)) => {
            log::debug!("Connection {} is closing, message dropped", connection_id);
            false
        }
    }
}
