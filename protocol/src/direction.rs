//! Compass headings carried by movement datagrams.

use crate::error::ProtocolError;
use std::fmt;

/// One-byte compass heading, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Direction {
    North = 0,
    NorthEast = 1,
    East = 2,
    SouthEast = 3,
    South = 4,
    SouthWest = 5,
    West = 6,
    NorthWest = 7,
}

impl Direction {
    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::NorthEast => "NorthEast",
            Direction::East => "East",
            Direction::SouthEast => "SouthEast",
            Direction::South => "South",
            Direction::SouthWest => "SouthWest",
            Direction::West => "West",
            Direction::NorthWest => "NorthWest",
        }
    }

    /// Label for a raw heading byte, `"Unknown"` when out of range.
    pub fn label(code: u8) -> &'static str {
        match Direction::try_from(code) {
            Ok(direction) => direction.name(),
            Err(_) => "Unknown",
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Direction::North),
            1 => Ok(Direction::NorthEast),
            2 => Ok(Direction::East),
            3 => Ok(Direction::SouthEast),
            4 => Ok(Direction::South),
            5 => Ok(Direction::SouthWest),
            6 => Ok(Direction::West),
            7 => Ok(Direction::NorthWest),
            other => Err(ProtocolError::UnknownDirection(other)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_codes_roundtrip() {
        for code in 0u8..=7 {
            let direction = Direction::try_from(code).unwrap();
            assert_eq!(direction as u8, code);
        }
    }

    #[test]
    fn test_unknown_direction_code() {
        assert_eq!(
            Direction::try_from(8),
            Err(ProtocolError::UnknownDirection(8))
        );
        assert_eq!(
            Direction::try_from(255),
            Err(ProtocolError::UnknownDirection(255))
        );
    }

    #[test]
    fn test_direction_labels() {
        assert_eq!(Direction::label(0), "North");
        assert_eq!(Direction::label(7), "NorthWest");
        assert_eq!(Direction::label(9), "Unknown");
    }
}
