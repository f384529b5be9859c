//! Per-connection state and the outbound handle used to reach one client.

use relay_common::ConnectionId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::PushError;

/// Lifecycle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, no valid `join` yet.
    Pending,
    /// Joined under a display name and receiving broadcasts.
    Active,
    /// Removed from the registry.
    Closed,
}

/// Sending half of a connection's bounded outbound queue.
///
/// The matching receiver is drained by the socket task that owns the write
/// half of the WebSocket. Once every handle is dropped that task closes the
/// socket.
#[derive(Debug, Clone)]
pub struct OutboundHandle {
    tx: mpsc::Sender<String>,
}

impl OutboundHandle {
    /// Queue `payload` for delivery without waiting.
    pub fn push(&self, payload: &str) -> Result<(), PushError> {
        self.tx.try_send(payload.to_string()).map_err(|err| match err {
            TrySendError::Full(_) => PushError::Full,
            TrySendError::Closed(_) => PushError::Closed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create an outbound queue holding at most `capacity` undelivered frames.
pub fn outbound_channel(capacity: usize) -> (OutboundHandle, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (OutboundHandle { tx }, rx)
}

/// A registry entry, or a point-in-time copy of one.
#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    /// Set once by the first valid `join`, never changed afterwards.
    pub display_name: Option<String>,
    pub state: ConnectionState,
    pub handle: OutboundHandle,
}

impl Connection {
    pub fn new(id: ConnectionId, handle: OutboundHandle) -> Self {
        Self {
            id,
            display_name: None,
            state: ConnectionState::Pending,
            handle,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    /// Display name, or an empty string before `join`.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_delivers_in_order() {
        let (handle, mut rx) = outbound_channel(4);
        handle.push("one").unwrap();
        handle.push("two").unwrap();
        assert_eq!(rx.try_recv().unwrap(), "one");
        assert_eq!(rx.try_recv().unwrap(), "two");
    }

    #[test]
    fn push_reports_full_queue() {
        let (handle, _rx) = outbound_channel(1);
        handle.push("one").unwrap();
        assert_eq!(handle.push("two"), Err(PushError::Full));
    }

    #[test]
    fn push_reports_closed_receiver() {
        let (handle, rx) = outbound_channel(4);
        drop(rx);
        assert!(handle.is_closed());
        assert_eq!(handle.push("one"), Err(PushError::Closed));
    }

    #[test]
    fn new_connection_is_pending_without_name() {
        let (handle, _rx) = outbound_channel(1);
        let conn = Connection::new(ConnectionId::from_raw(1), handle);
        assert_eq!(conn.state, ConnectionState::Pending);
        assert!(!conn.is_active());
        assert_eq!(conn.name(), "");
    }
}
