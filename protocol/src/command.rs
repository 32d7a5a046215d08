//! Command codes identifying the payload shape of a datagram.

use crate::error::ProtocolError;
use std::fmt;

/// The discriminant byte leading every datagram.
///
/// Codes are part of the wire protocol and must not be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    Position = 0,
    Move = 1,
    PositionRtt = 2,
    MoveRtt = 3,
    DefaultRtt = 4,
    UserAssignment = 5,
    PortRequest = 6,
    PortAssignment = 7,
}

impl Command {
    pub fn name(self) -> &'static str {
        match self {
            Command::Position => "POSITION",
            Command::Move => "MOVE",
            Command::PositionRtt => "POSITION_RTT",
            Command::MoveRtt => "MOVE_RTT",
            Command::DefaultRtt => "DEFAULT_RTT",
            Command::UserAssignment => "USER_ASSIGNMENT",
            Command::PortRequest => "PORT_REQUEST",
            Command::PortAssignment => "PORT_ASSIGNMENT",
        }
    }

    /// Label for a raw command byte, falling back to `"Unknown"` for codes
    /// outside the enumeration. Intended for log lines.
    pub fn label(code: u8) -> &'static str {
        match Command::try_from(code) {
            Ok(command) => command.name(),
            Err(_) => "Unknown",
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Command::Position),
            1 => Ok(Command::Move),
            2 => Ok(Command::PositionRtt),
            3 => Ok(Command::MoveRtt),
            4 => Ok(Command::DefaultRtt),
            5 => Ok(Command::UserAssignment),
            6 => Ok(Command::PortRequest),
            7 => Ok(Command::PortAssignment),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
