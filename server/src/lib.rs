//! # State-Synchronization Server Library
//!
//! Authoritative UDP server that tracks each client's last-known
//! position, rebroadcasts it to peers, echoes round-trip timestamps,
//! and reclaims the resources of clients that go silent.
//!
//! ## Module Organization
//!
//! ### Port Allocator (`port_allocator`)
//! A bounded pool of listen ports. Every registered client holds one
//! private port on which it receives server-originated traffic,
//! returned to the pool when the client is swept.
//!
//! ### Registry (`registry`)
//! The concurrent client registry, keyed both by sending address and
//! by the compact numeric id assigned at registration. One
//! readers-writer lock covers both maps, so registration, lookups and
//! the idle sweep each observe a consistent view.
//!
//! ### Network (`network`)
//! The bound socket, the paced receive loop, and the per-datagram
//! dispatcher that drives registration, state updates,
//! broadcast-with-exclusion and RTT echoes.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::{Server, ServerConfig};
//! use server::port_allocator::PortAllocator;
//! use server::registry::Registry;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = Arc::new(Registry::new(PortAllocator::new(9001, 9255)));
//!     let server = Server::bind("127.0.0.1:9000", registry, ServerConfig::default()).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod network;
pub mod port_allocator;
pub mod registry;
