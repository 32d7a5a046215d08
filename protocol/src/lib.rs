//! Fixed-layout wire protocol shared by the server and its clients.
//!
//! Every datagram is a little-endian, fixed-width record whose first byte
//! is a [`Command`] code. [`decode`] and [`encode`] are stateless and pure,
//! so they can be called from any task without synchronization. See
//! [`Packet`] for the exact byte layouts.

pub mod command;
pub mod direction;
pub mod error;
pub mod packet;

pub use command::Command;
pub use direction::Direction;
pub use error::ProtocolError;
pub use packet::{decode, encode, Packet};
