//! Inbound event dispatch and broadcast fan-out.

use std::collections::VecDeque;

use relay_common::{ConnectionId, IdAllocator, InboundEvent, Notice};
use tokio::sync::mpsc;

use crate::error::RegistryError;

use super::connection::{outbound_channel, Connection};
use super::registry::Registry;

/// Default capacity of each connection's outbound queue.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// What the relay did with one inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The sender joined; `delivered` members were told.
    Joined { delivered: usize },
    /// A chat line reached `delivered` members.
    Relayed { delivered: usize },
    /// The frame had no effect.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Not parseable as an inbound event.
    Malformed,
    /// Parsed, but the `type` is not one the relay handles.
    UnknownType,
    /// `join` with an empty or whitespace-only username.
    BlankUsername,
    /// `chat` before a successful `join`.
    NotJoined,
    /// A second `join`, or a frame racing the connection's removal.
    Registry(RegistryError),
}

/// Connection registry plus the state machine that drives it.
pub struct Relay {
    registry: Registry,
    ids: IdAllocator,
    outbound_buffer: usize,
}

impl Relay {
    pub fn new(outbound_buffer: usize) -> Self {
        Self {
            registry: Registry::new(),
            ids: IdAllocator::new(),
            outbound_buffer,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a newly accepted transport connection as `Pending`.
    ///
    /// Returns its id and the receiving end of its outbound queue, which the
    /// caller must drain onto the socket.
    pub fn accept(&self) -> Result<(ConnectionId, mpsc::Receiver<String>), RegistryError> {
        let id = self.ids.next_id();
        let (handle, outbound_rx) = outbound_channel(self.outbound_buffer);
        self.registry.register(id, handle)?;
        tracing::info!(
            conn_id = %id,
            connections = self.registry.len(),
            "connection accepted"
        );
        Ok((id, outbound_rx))
    }

    /// Handle one inbound text frame from `id`.
    pub fn handle_text(&self, id: ConnectionId, text: &str) -> Dispatch {
        match InboundEvent::parse(text) {
            Ok(event) => self.handle_event(id, event),
            Err(err) => {
                tracing::debug!(conn_id = %id, %err, "ignoring malformed message");
                Dispatch::Ignored(IgnoreReason::Malformed)
            }
        }
    }

    pub fn handle_event(&self, id: ConnectionId, event: InboundEvent) -> Dispatch {
        match event {
            InboundEvent::Join { username } => self.join(id, &username),
            InboundEvent::Chat { message } => self.chat(id, message),
            InboundEvent::Unknown => {
                tracing::debug!(conn_id = %id, "ignoring message with unknown type");
                Dispatch::Ignored(IgnoreReason::UnknownType)
            }
        }
    }

    fn join(&self, id: ConnectionId, username: &str) -> Dispatch {
        let name = username.trim();
        if name.is_empty() {
            tracing::debug!(conn_id = %id, "ignoring join with blank username");
            return Dispatch::Ignored(IgnoreReason::BlankUsername);
        }

        if let Err(err) = self.registry.commit_join(id, name) {
            tracing::debug!(conn_id = %id, %err, "ignoring join");
            return Dispatch::Ignored(IgnoreReason::Registry(err));
        }

        tracing::info!(
            conn_id = %id,
            username = %name,
            members = self.registry.active_count(),
            "member joined"
        );
        let delivered = self.broadcast(id, Notice::joined(name));
        Dispatch::Joined { delivered }
    }

    fn chat(&self, id: ConnectionId, message: String) -> Dispatch {
        let sender = match self.registry.get(id) {
            Some(conn) if conn.is_active() => conn,
            Some(_) => {
                tracing::debug!(conn_id = %id, "ignoring chat before join");
                return Dispatch::Ignored(IgnoreReason::NotJoined);
            }
            None => {
                return Dispatch::Ignored(IgnoreReason::Registry(
                    RegistryError::UnknownConnection(id),
                ))
            }
        };

        let delivered = self.broadcast(id, Notice::chat(sender.name(), message));
        Dispatch::Relayed { delivered }
    }

    /// Handle the transport closing `id`.
    ///
    /// Returns the removed entry the first time it is called for a connection.
    /// A member that had joined is announced as having left.
    pub fn disconnect(&self, id: ConnectionId) -> Option<Connection> {
        let removed = self.registry.remove(id)?;
        tracing::info!(
            conn_id = %id,
            username = %removed.name(),
            connections = self.registry.len(),
            "connection closed"
        );
        if removed.display_name.is_some() {
            self.broadcast(id, Notice::left(removed.name()));
        }
        Some(removed)
    }

    /// Push `notice` to every active member except `origin`.
    ///
    /// A target whose push fails is removed and its own leave notice is queued
    /// behind this one, so one dead client never stops delivery to the rest.
    /// Returns how many members received `notice` itself.
    pub fn broadcast(&self, origin: ConnectionId, notice: Notice) -> usize {
        let mut pending = VecDeque::from([(origin, notice)]);
        let mut first_delivered = None;

        while let Some((origin, notice)) = pending.pop_front() {
            let payload = notice.to_string();
            let mut delivered = 0;

            for target in self.registry.snapshot_others(origin) {
                match target.handle.push(&payload) {
                    Ok(()) => delivered += 1,
                    Err(err) => {
                        tracing::warn!(
                            conn_id = %target.id,
                            username = %target.name(),
                            %err,
                            "push failed, dropping connection"
                        );
                        if let Some(gone) = self.registry.remove(target.id) {
                            pending.push_back((gone.id, Notice::left(gone.name())));
                        }
                    }
                }
            }

            if first_delivered.is_none() {
                first_delivered = Some(delivered);
            }
        }

        first_delivered.unwrap_or_default()
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOUND_BUFFER)
    }
}
