//! Connection registry
//!
//! Maps each user handle to the one connection currently allowed to
//! receive frames for it. The table lives behind the registry's own
//! sharded locking and is never handed out; every change goes through
//! [`ConnectionRegistry::register`] and [`ConnectionRegistry::unregister`].

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::types::UserHandle;

pub mod connection;

pub use connection::{
    ConnectionHandle, ConnectionId, OutboundQueue, SendFailure, DEFAULT_OUTBOUND_CAPACITY,
};

/// In-memory registry of live connections keyed by user handle
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<UserHandle, ConnectionHandle>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Install `conn` under `handle`, replacing any earlier connection.
    ///
    /// The replaced connection is returned untouched; the registry never
    /// closes it.
    pub fn register(&self, handle: UserHandle, conn: ConnectionHandle) -> Option<ConnectionHandle> {
        let id = conn.id();
        let previous = self.connections.insert(handle.clone(), conn);
        match &previous {
            Some(old) => debug!(%handle, connection = %id, superseded = %old.id(), "Connection replaced"),
            None => debug!(%handle, connection = %id, "Connection registered"),
        }
        previous
    }

    /// Remove `handle` only while it still maps to `conn`.
    ///
    /// Returns `true` if an entry was removed. A stale connection that lost
    /// a registration race cannot evict its replacement.
    pub fn unregister(&self, handle: &UserHandle, conn: &ConnectionHandle) -> bool {
        let removed = self
            .connections
            .remove_if(handle, |_, current| current.same_connection(conn))
            .is_some();
        if removed {
            debug!(%handle, connection = %conn.id(), "Connection unregistered");
        } else {
            trace!(%handle, connection = %conn.id(), "Unregister skipped, not the current connection");
        }
        removed
    }

    /// Live connection for `handle`, if any
    pub fn lookup(&self, handle: &UserHandle) -> Option<ConnectionHandle> {
        self.connections.get(handle).map(|entry| entry.value().clone())
    }

    /// Best-effort delivery of one text frame to `handle`.
    ///
    /// Returns `false` when nobody is registered or the write fails; the
    /// failure is logged, never raised.
    pub fn send(&self, handle: &UserHandle, payload: impl Into<String>) -> bool {
        // The shard guard is held while enqueueing so concurrent senders to
        // one destination keep the order of their calls.
        let Some(entry) = self.connections.get(handle) else {
            debug!(%handle, "No connection registered");
            return false;
        };
        match entry.value().send(payload.into()) {
            Ok(()) => true,
            Err(failure) => {
                debug!(%handle, connection = %entry.value().id(), %failure, "Write failed");
                false
            }
        }
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Snapshot of the handles registered right now, sorted
    pub fn handles(&self) -> Vec<UserHandle> {
        let mut handles: Vec<UserHandle> = self
            .connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        handles.sort();
        handles
    }

    /// Close every registered connection. Used on shutdown.
    ///
    /// Entries are left in place; each session unregisters itself once its
    /// read side ends.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        for entry in self.connections.iter() {
            entry.value().close();
            closed += 1;
        }
        debug!(closed, "Closed all registered connections");
        closed
    }
}
