//! UDP receive loop and per-datagram dispatch.
//!
//! The receive loop reads one datagram at a time and hands each one to
//! its own task, so handling proceeds concurrently while the loop goes
//! straight back to the socket. A fixed pause after each dispatch paces
//! ingestion; it is not backpressure. The idle sweep runs on its own
//! timer, independent of packet arrival.

use crate::registry::{PositionState, Registry};
use log::{debug, error, info, warn};
use protocol::{decode, encode, Command, Direction, Packet};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Timing knobs for the receive loop and the idle sweep.
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Fixed pause after dispatching each datagram.
    pub pacing: Duration,
    /// Interval between idle sweeps.
    pub sweep_interval: Duration,
    /// Silence threshold after which a client is reclaimed.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(1),
            sweep_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// The bound socket plus everything needed to serve it.
pub struct Server {
    socket: Arc<UdpSocket>,
    registry: Arc<Registry>,
    config: ServerConfig,
}

impl Server {
    pub async fn bind(
        addr: &str,
        registry: Arc<Registry>,
        config: ServerConfig,
    ) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("UDP server listening on {}", socket.local_addr()?);

        Ok(Self {
            socket,
            registry,
            config,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    fn spawn_sweeper(&self) {
        let registry = Arc::clone(&self.registry);
        let ServerConfig {
            sweep_interval,
            idle_timeout,
            ..
        } = self.config;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_interval);
            // The first tick fires immediately; skip it.
            interval.tick().await;

            loop {
                interval.tick().await;

                let removed = registry.sweep(idle_timeout).await;
                if !removed.is_empty() {
                    info!("sweep removed {} idle client(s)", removed.len());
                }

                let (clients, available) = registry.stats().await;
                debug!("active clients: {}, available ports: {}", clients, available);
            }
        });
    }

    /// Receive loop. Spawns one task per datagram and never returns
    /// under normal operation; shutdown happens by closing the process
    /// around it.
    pub async fn run(&self) -> io::Result<()> {
        self.spawn_sweeper();

        let dispatcher = Dispatcher::new(Arc::clone(&self.socket), Arc::clone(&self.registry));
        let mut buffer = [0u8; 1024];

        loop {
            match self.socket.recv_from(&mut buffer).await {
                Ok((len, sender)) => {
                    let dispatcher = dispatcher.clone();
                    let datagram = buffer[..len].to_vec();

                    tokio::spawn(async move {
                        dispatcher.handle_datagram(&datagram, sender).await;
                    });
                }
                Err(e) => {
                    error!("error receiving datagram: {}", e);
                    continue;
                }
            }

            tokio::time::sleep(self.config.pacing).await;
        }
    }
}

/// Per-datagram handling, separate from the receive loop so every
/// datagram can run on its own task.
#[derive(Clone)]
pub struct Dispatcher {
    socket: Arc<UdpSocket>,
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(socket: Arc<UdpSocket>, registry: Arc<Registry>) -> Self {
        Self { socket, registry }
    }

    pub async fn handle_datagram(&self, data: &[u8], sender: SocketAddr) {
        // Single-byte registration request; no full decode needed.
        if data.first() == Some(&(Command::PortRequest as u8)) {
            self.register_and_announce(sender).await;
            return;
        }

        let packet = match decode(data) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("dropping datagram from {}: {}", sender, e);
                return;
            }
        };

        match packet {
            Packet::PositionRtt {
                user_id,
                x,
                y,
                z,
                rot_y,
                timestamp_rtt,
            } => {
                let position = PositionState {
                    x,
                    y,
                    z,
                    rot_y,
                    timestamp_rtt,
                };
                self.handle_position_rtt(sender, user_id, position).await;
            }
            Packet::MoveRtt {
                user_id,
                timestamp_rtt,
                ..
            } => {
                self.handle_move_rtt(user_id, timestamp_rtt).await;
            }
            Packet::Position {
                user_id,
                x,
                y,
                z,
                rot_y,
            } => {
                debug!(
                    "position telemetry from {}: id={} x={:.2} y={:.2} z={:.2} rot_y={:.2}",
                    sender, user_id, x, y, z, rot_y
                );
            }
            Packet::Move {
                user_id,
                direction,
                speed,
            } => {
                debug!(
                    "move telemetry from {}: id={} direction={} speed={:.2}",
                    sender,
                    user_id,
                    Direction::label(direction),
                    speed
                );
            }
            // PortRequest never reaches here: the first-byte fast path
            // consumes it. The rest are server-originated and carry no
            // inbound meaning.
            Packet::PortRequest
            | Packet::DefaultRtt { .. }
            | Packet::UserAssignment { .. }
            | Packet::PortAssignment { .. } => {
                debug!("ignoring {} from {}", packet.command(), sender);
            }
        }
    }

    /// The one registration transition: register (or fetch) the sender,
    /// then announce its credentials. Invoked from the PORT_REQUEST path
    /// and from the unknown-sender branch of PositionRtt.
    ///
    /// Replies go out even for an already-known address so a client can
    /// re-request credentials it lost; the values are identical each time.
    async fn register_and_announce(&self, sender: SocketAddr) {
        let registration = match self.registry.register_or_get(sender).await {
            Ok(registration) => registration,
            Err(e) => {
                warn!("refusing registration for {}: {}", sender, e);
                return;
            }
        };

        if registration.is_new {
            info!(
                "registered client {} from {} on listen port {}",
                registration.user_id, sender, registration.port
            );
        }

        self.send(
            &Packet::PortAssignment {
                user_id: registration.user_id,
                port: registration.port,
            },
            sender,
        )
        .await;

        self.send(
            &Packet::UserAssignment {
                user_id: registration.user_id,
            },
            registration.listen_addr,
        )
        .await;
    }

    async fn handle_position_rtt(
        &self,
        sender: SocketAddr,
        user_id: u8,
        position: PositionState,
    ) {
        let Some(client) = self.registry.lookup_by_addr(sender).await else {
            // Unknown address: run the registration transition and drop
            // this payload. The client resends once it has credentials.
            self.register_and_announce(sender).await;
            return;
        };

        self.registry.update_position(user_id, position).await;
        self.broadcast_position(user_id, position).await;

        // The echo targets the sender's listen address, not the ephemeral
        // address the datagram came from.
        self.send(
            &Packet::DefaultRtt {
                timestamp_rtt: position.timestamp_rtt,
            },
            client.listen_addr(),
        )
        .await;
    }

    async fn handle_move_rtt(&self, user_id: u8, timestamp_rtt: u32) {
        let Some(client) = self.registry.lookup_by_id(user_id).await else {
            debug!("move rtt for unknown client {}", user_id);
            return;
        };

        self.send(&Packet::DefaultRtt { timestamp_rtt }, client.listen_addr())
            .await;
    }

    /// Fans a stripped Position packet out to every other client's
    /// listen address.
    async fn broadcast_position(&self, user_id: u8, position: PositionState) {
        let data = encode(&Packet::Position {
            user_id,
            x: position.x,
            y: position.y,
            z: position.z,
            rot_y: position.rot_y,
        });

        for (peer_id, listen_addr) in self.registry.listen_addrs_except(user_id).await {
            if let Err(e) = self.socket.send_to(&data, listen_addr).await {
                warn!(
                    "failed to send to client {} at {}: {}",
                    peer_id, listen_addr, e
                );
            }
        }
    }

    async fn send(&self, packet: &Packet, addr: SocketAddr) {
        if let Err(e) = self.socket.send_to(&encode(packet), addr).await {
            warn!("failed to send {} to {}: {}", packet.command(), addr, e);
        }
    }
}
