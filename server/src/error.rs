//! Error types for client registration.

use thiserror::Error;

/// Failures surfaced while registering a client.
///
/// Neither variant is fatal to the server: registration is simply
/// refused and the client is expected to retry its PORT_REQUEST later.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Every port in the configured allocation range is currently held.
    #[error("no listen ports available")]
    PortsExhausted,

    /// The one-byte user id counter has run out. Ids are never recycled,
    /// so once 255 distinct addresses have registered no further clients
    /// can be accepted.
    #[error("user id space exhausted")]
    IdsExhausted,
}
