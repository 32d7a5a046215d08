//! Client registry keyed by network address and by numeric user id.
//!
//! Both maps and the id counter live behind one readers-writer lock, so
//! registration, lookups and the idle sweep each observe a consistent
//! view. The registry's cardinality is bounded by the one-byte id space,
//! which keeps the coarse single lock affordable.

use crate::error::RegistryError;
use crate::port_allocator::PortAllocator;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Last-known state reported by a client, taken verbatim from its most
/// recent PositionRtt payload. Non-RTT telemetry never reaches here.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rot_y: f32,
    pub timestamp_rtt: u32,
}

/// A registered client and the resources it holds.
#[derive(Debug, Clone)]
pub struct Client {
    /// Assigned at registration, monotonically increasing, never reused.
    pub id: u8,
    /// Ephemeral address the client sends from.
    pub addr: SocketAddr,
    /// Server-assigned port the client receives on (same host as `addr`).
    pub listen_port: u16,
    pub position: PositionState,
    pub last_seen: Instant,
}

impl Client {
    fn new(id: u8, addr: SocketAddr, listen_port: u16) -> Self {
        Self {
            id,
            addr,
            listen_port,
            position: PositionState::default(),
            last_seen: Instant::now(),
        }
    }

    /// Address all server-originated traffic for this client targets.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr.ip(), self.listen_port)
    }

    pub fn is_idle(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Outcome of [`Registry::register_or_get`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    pub user_id: u8,
    pub port: u16,
    pub listen_addr: SocketAddr,
    /// False when the address was already known and the existing
    /// assignment was returned unchanged.
    pub is_new: bool,
}

struct Inner {
    clients: HashMap<u8, Client>,
    by_addr: HashMap<SocketAddr, u8>,
    /// Next id to hand out, starting at 1. Wraps to 0 when the u8 space
    /// is spent, after which registration is refused.
    next_id: u8,
}

/// Concurrent client registry backed by a single readers-writer lock.
pub struct Registry {
    inner: RwLock<Inner>,
    ports: PortAllocator,
}

impl Registry {
    pub fn new(ports: PortAllocator) -> Self {
        Self {
            inner: RwLock::new(Inner {
                clients: HashMap::new(),
                by_addr: HashMap::new(),
                next_id: 1,
            }),
            ports,
        }
    }

    /// Registers `addr` or returns its existing assignment.
    ///
    /// Idempotent: a known address gets back the same id and port with
    /// `is_new = false` and no state changes. A new address costs one
    /// port from the pool and the next id; if either resource is spent
    /// the error propagates and no record is created.
    pub async fn register_or_get(
        &self,
        addr: SocketAddr,
    ) -> Result<Registration, RegistryError> {
        let mut inner = self.inner.write().await;

        if let Some(&id) = inner.by_addr.get(&addr) {
            let client = &inner.clients[&id];
            return Ok(Registration {
                user_id: id,
                port: client.listen_port,
                listen_addr: client.listen_addr(),
                is_new: false,
            });
        }

        if inner.next_id == 0 {
            return Err(RegistryError::IdsExhausted);
        }

        let port = self.ports.acquire()?;
        let id = inner.next_id;
        inner.next_id = inner.next_id.wrapping_add(1);

        let client = Client::new(id, addr, port);
        let registration = Registration {
            user_id: id,
            port,
            listen_addr: client.listen_addr(),
            is_new: true,
        };

        inner.by_addr.insert(addr, id);
        inner.clients.insert(id, client);

        Ok(registration)
    }

    pub async fn lookup_by_addr(&self, addr: SocketAddr) -> Option<Client> {
        let inner = self.inner.read().await;
        inner
            .by_addr
            .get(&addr)
            .and_then(|id| inner.clients.get(id))
            .cloned()
    }

    pub async fn lookup_by_id(&self, id: u8) -> Option<Client> {
        let inner = self.inner.read().await;
        inner.clients.get(&id).cloned()
    }

    /// Overwrites a client's stored state and refreshes its last-seen
    /// time. No-op for an unknown id.
    pub async fn update_position(&self, id: u8, position: PositionState) {
        let mut inner = self.inner.write().await;
        if let Some(client) = inner.clients.get_mut(&id) {
            client.position = position;
            client.last_seen = Instant::now();
        }
    }

    /// Snapshot of every client's listen address except the given id,
    /// in map iteration order. Used for broadcast fan-out.
    pub async fn listen_addrs_except(&self, exclude_id: u8) -> Vec<(u8, SocketAddr)> {
        let inner = self.inner.read().await;
        inner
            .clients
            .values()
            .filter(|client| client.id != exclude_id)
            .map(|client| (client.id, client.listen_addr()))
            .collect()
    }

    /// Removes every client idle longer than `idle_timeout`, returning
    /// each one's port to the pool. Runs under the write lock for its
    /// full duration so removal is never interleaved with a partial
    /// read of the same record. Returns the removed ids.
    pub async fn sweep(&self, idle_timeout: Duration) -> Vec<u8> {
        let mut inner = self.inner.write().await;

        let expired: Vec<u8> = inner
            .clients
            .values()
            .filter(|client| client.is_idle(idle_timeout))
            .map(|client| client.id)
            .collect();

        for id in &expired {
            if let Some(client) = inner.clients.remove(id) {
                inner.by_addr.remove(&client.addr);
                self.ports.release(client.listen_port);
                info!(
                    "removed idle client {} (port {} returned to pool)",
                    id, client.listen_port
                );
            }
        }

        expired
    }

    /// Current client count and remaining pool capacity.
    pub async fn stats(&self) -> (usize, usize) {
        let inner = self.inner.read().await;
        (inner.clients.len(), self.ports.available())
    }
}
