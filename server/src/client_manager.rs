//! Live connection registry owned by the hub
//!
//! This module tracks every open connection the hub knows about:
//! - the bounded outbound queue drained by the connection's writer task
//! - which signed-in user, if any, the connection speaks for
//! - which table and seat the connection is currently bound to
//!
//! Delivery never waits. Everything one hub message produces for a
//! connection travels as a single batch, so a queue slot stands for one
//! unit of work rather than one frame. A batch that does not fit in a
//! recipient's queue marks that recipient as failed, and the hub then
//! drops it.

use clue_shared::{PlayerId, ServerFrame};
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Identifier handed out by the listener, unique for the process lifetime.
pub type ConnectionId = u64;

/// Frames the writer sends back to back, in order.
pub type FrameBatch = Vec<ServerFrame>;

/// A connected client and what it is bound to
#[derive(Debug)]
pub struct Client {
    pub id: ConnectionId,
    pub addr: SocketAddr,
    pub connected_at: Instant,
    /// Token of the signed-in user
    pub user: Option<String>,
    /// Game id and seat this connection is playing
    pub table: Option<(String, PlayerId)>,
    outbound: mpsc::Sender<FrameBatch>,
}

impl Client {
    pub fn new(id: ConnectionId, addr: SocketAddr, outbound: mpsc::Sender<FrameBatch>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            user: None,
            table: None,
            outbound,
        }
    }

    /// Queues a batch without waiting. False when the queue is full or the
    /// writer is gone.
    pub fn send(&self, frames: FrameBatch) -> bool {
        match self.outbound.try_send(frames) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Every connection registered with the hub, bounded by `max_clients`.
pub struct ClientManager {
    clients: HashMap<ConnectionId, Client>,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Registers a connection. Returns false at capacity or for a duplicate
    /// id; the caller must then drop the sender so the socket closes.
    pub fn add_client(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        outbound: mpsc::Sender<FrameBatch>,
    ) -> bool {
        if self.clients.len() >= self.max_clients || self.clients.contains_key(&id) {
            return false;
        }

        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id, Client::new(id, addr, outbound));
        true
    }

    /// Forgets a connection. Dropping the returned client drops its outbound
    /// sender, which ends the writer task.
    pub fn remove_client(&mut self, id: &ConnectionId) -> Option<Client> {
        let client = self.clients.remove(id)?;
        info!(
            "Client {} disconnected after {:?}",
            client.id,
            client.connected_at.elapsed()
        );
        Some(client)
    }

    pub fn get(&self, id: &ConnectionId) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut Client> {
        self.clients.get_mut(id)
    }

    /// Drops every connection at once, used on shutdown.
    pub fn clear(&mut self) {
        self.clients.clear();
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
