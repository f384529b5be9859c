//! Membership table shared by every connection task.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use relay_common::ConnectionId;

use crate::error::RegistryError;

use super::connection::{Connection, ConnectionState, OutboundHandle};

/// Shared registry of live connections.
///
/// One `parking_lot::Mutex` guards the whole table so that every mutation and
/// every snapshot observes a single serial order. The lock is never held
/// across I/O: callers take a snapshot, drop the guard, then push.
///
/// Entries are keyed by id, so iteration follows acceptance order.
pub struct Registry {
    members: Mutex<BTreeMap<ConnectionId, Connection>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(BTreeMap::new()),
        }
    }

    /// Insert a freshly accepted connection in the `Pending` state.
    pub fn register(
        &self,
        id: ConnectionId,
        handle: OutboundHandle,
    ) -> Result<Connection, RegistryError> {
        let mut members = self.members.lock();
        if members.contains_key(&id) {
            return Err(RegistryError::DuplicateId(id));
        }
        let conn = Connection::new(id, handle);
        members.insert(id, conn.clone());
        Ok(conn)
    }

    /// Move a `Pending` connection to `Active` under `display_name`.
    pub fn commit_join(&self, id: ConnectionId, display_name: &str) -> Result<(), RegistryError> {
        debug_assert!(!display_name.is_empty());
        let mut members = self.members.lock();
        let conn = members
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection(id))?;
        if conn.state != ConnectionState::Pending {
            return Err(RegistryError::AlreadyJoined(id));
        }
        conn.display_name = Some(display_name.to_string());
        conn.state = ConnectionState::Active;
        Ok(())
    }

    /// Remove a connection. Returns the removed entry (now `Closed`) the first
    /// time, `None` on every later call.
    pub fn remove(&self, id: ConnectionId) -> Option<Connection> {
        let mut removed = self.members.lock().remove(&id)?;
        removed.state = ConnectionState::Closed;
        Some(removed)
    }

    /// Every `Active` member except `exclude`, as of one instant.
    pub fn snapshot_others(&self, exclude: ConnectionId) -> Vec<Connection> {
        self.members
            .lock()
            .values()
            .filter(|conn| conn.id != exclude && conn.is_active())
            .cloned()
            .collect()
    }

    pub fn get(&self, id: ConnectionId) -> Option<Connection> {
        self.members.lock().get(&id).cloned()
    }

    /// Number of registered connections, joined or not.
    pub fn len(&self) -> usize {
        self.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.lock().is_empty()
    }

    /// Number of joined members.
    pub fn active_count(&self) -> usize {
        self.members
            .lock()
            .values()
            .filter(|conn| conn.is_active())
            .count()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
