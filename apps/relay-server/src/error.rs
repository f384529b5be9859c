use relay_common::ConnectionId;

/// Failures from [`Registry`](crate::gateway::registry::Registry) mutations.
///
/// None of these are ever reported to a client. `DuplicateId` rejects the new
/// connection; the other two are expected races and are ignored by the relay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("connection {0} is already registered")]
    DuplicateId(ConnectionId),
    #[error("connection {0} is not registered")]
    UnknownConnection(ConnectionId),
    #[error("connection {0} has already joined")]
    AlreadyJoined(ConnectionId),
}

/// Why a push to a single connection's outbound queue failed.
///
/// Either case is terminal for the target connection; pushes are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    /// The connection's writer has gone away.
    #[error("outbound channel closed")]
    Closed,
    /// The client is not draining its queue fast enough.
    #[error("outbound queue full")]
    Full,
}
