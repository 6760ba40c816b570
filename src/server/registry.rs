//! Per-connection client registry.
//!
//! The listener owns one registry and records every accepted connection in
//! it. A client is present exactly while its connection task is live:
//! `add` on accept, `remove` when the task finishes, and `shutdown` to
//! cancel the task early (`shutdown_all` sweeps the whole table when the
//! process is asked to stop). Aborting the task drops the socket and any
//! pending timers with it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

use tokio::task::AbortHandle;

/// State for one accepted connection.
pub struct Client {
    pub id: u64,
    pub peer: SocketAddr,
    pub local: SocketAddr,
    pub accepted: Instant,
    abort: Option<AbortHandle>,
}

#[derive(Default)]
pub struct Registry {
    clients: HashMap<u64, Client>,
    next_id: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a freshly accepted connection and returns its id.
    pub fn add(&mut self, peer: SocketAddr, local: SocketAddr) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.clients.insert(
            id,
            Client {
                id,
                peer,
                local,
                accepted: Instant::now(),
                abort: None,
            },
        );

        id
    }

    /// Attaches the spawned task's abort handle. A no-op when the client
    /// already finished and removed itself.
    pub fn attach(&mut self, id: u64, handle: AbortHandle) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.abort = Some(handle);
        }
    }

    pub fn lookup(&self, id: u64) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Detaches a client. Idempotent; returns whether it was still present.
    pub fn remove(&mut self, id: u64) -> bool {
        self.clients.remove(&id).is_some()
    }

    /// Cancels a live connection: aborts its task and detaches it.
    pub fn shutdown(&mut self, id: u64) {
        if let Some(client) = self.clients.remove(&id) {
            if let Some(handle) = client.abort {
                handle.abort();
            }
        }
    }

    /// Cancels every live connection, leaving the table empty. Called on
    /// graceful shutdown.
    pub fn shutdown_all(&mut self) {
        let ids: Vec<u64> = self.clients.keys().copied().collect();
        for id in ids {
            self.shutdown(id);
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
