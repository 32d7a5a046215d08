//! Error types for the wire protocol.

use crate::command::Command;
use thiserror::Error;

/// Decode failures. Encoding cannot fail.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Zero-length datagram, not even a command byte.
    #[error("empty datagram")]
    EmptyDatagram,

    /// First byte outside the defined command enumeration.
    #[error("unknown command: {0}")]
    UnknownCommand(u8),

    /// Payload shorter than the command's fixed size.
    #[error("truncated {command} message: expected {expected} bytes, received {received} bytes")]
    TruncatedMessage {
        command: Command,
        expected: usize,
        received: usize,
    },

    /// Heading byte outside the defined direction enumeration. Returned
    /// by `Direction::try_from` only; the codec passes raw heading bytes
    /// through unvalidated.
    #[error("unknown direction: {0}")]
    UnknownDirection(u8),
}
