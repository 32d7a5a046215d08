//! Message variants and the fixed-layout binary codec.
//!
//! Layouts, little-endian, sizes in bytes:
//!
//! | Variant          | Fields after command byte              | Total |
//! |------------------|----------------------------------------|-------|
//! | `Position`       | id:u8, x,y,z,rot_y:f32                 | 18    |
//! | `PositionRtt`    | id:u8, x,y,z,rot_y:f32, ts:u32         | 22    |
//! | `Move`           | id:u8, direction:u8, speed:f32         | 7     |
//! | `MoveRtt`        | id:u8, direction:u8, speed:f32, ts:u32 | 11    |
//! | `DefaultRtt`     | ts:u32 (no id)                         | 5     |
//! | `UserAssignment` | id:u8                                  | 2     |
//! | `PortRequest`    | (command byte only)                    | 1     |
//! | `PortAssignment` | id:u8, port:u16                        | 4     |

use crate::command::Command;
use crate::error::ProtocolError;
use bytes::{Buf, BufMut};

/// Every message that can cross the wire, in either direction.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// One-way position telemetry; also the broadcast the server fans out.
    Position {
        user_id: u8,
        x: f32,
        y: f32,
        z: f32,
        rot_y: f32,
    },
    /// Position report carrying a client timestamp to be echoed back.
    PositionRtt {
        user_id: u8,
        x: f32,
        y: f32,
        z: f32,
        rot_y: f32,
        timestamp_rtt: u32,
    },
    /// One-way movement telemetry. `direction` is the raw heading byte;
    /// values outside [`crate::Direction`] pass through unvalidated and
    /// label as `"Unknown"`.
    Move {
        user_id: u8,
        direction: u8,
        speed: f32,
    },
    /// Movement report carrying a client timestamp to be echoed back.
    MoveRtt {
        user_id: u8,
        direction: u8,
        speed: f32,
        timestamp_rtt: u32,
    },
    /// Server echo of a client-supplied timestamp for latency measurement.
    DefaultRtt { timestamp_rtt: u32 },
    /// Tells a client the numeric id it was assigned.
    UserAssignment { user_id: u8 },
    /// Single-byte request for a listen port and user id.
    PortRequest,
    /// Tells a client the listen port it was assigned.
    PortAssignment { user_id: u8, port: u16 },
}

impl Packet {
    pub fn command(&self) -> Command {
        match self {
            Packet::Position { .. } => Command::Position,
            Packet::Move { .. } => Command::Move,
            Packet::PositionRtt { .. } => Command::PositionRtt,
            Packet::MoveRtt { .. } => Command::MoveRtt,
            Packet::DefaultRtt { .. } => Command::DefaultRtt,
            Packet::UserAssignment { .. } => Command::UserAssignment,
            Packet::PortRequest => Command::PortRequest,
            Packet::PortAssignment { .. } => Command::PortAssignment,
        }
    }

    /// Encoded size of a variant, command byte included.
    pub const fn wire_size(command: Command) -> usize {
        match command {
            Command::Position => 18,
            Command::Move => 7,
            Command::PositionRtt => 22,
            Command::MoveRtt => 11,
            Command::DefaultRtt => 5,
            Command::UserAssignment => 2,
            Command::PortRequest => 1,
            Command::PortAssignment => 4,
        }
    }
}

/// Parses one datagram into a [`Packet`].
///
/// Fails on an unknown command byte or a payload shorter than the
/// command's fixed size; bytes beyond the declared size are ignored.
pub fn decode(data: &[u8]) -> Result<Packet, ProtocolError> {
    let &code = data.first().ok_or(ProtocolError::EmptyDatagram)?;
    let command = Command::try_from(code)?;

    let expected = Packet::wire_size(command);
    if data.len() < expected {
        return Err(ProtocolError::TruncatedMessage {
            command,
            expected,
            received: data.len(),
        });
    }

    // Field reads below stay within the declared size.
    let mut buf = &data[1..expected];

    let packet = match command {
        Command::Position => Packet::Position {
            user_id: buf.get_u8(),
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            z: buf.get_f32_le(),
            rot_y: buf.get_f32_le(),
        },
        Command::PositionRtt => Packet::PositionRtt {
            user_id: buf.get_u8(),
            x: buf.get_f32_le(),
            y: buf.get_f32_le(),
            z: buf.get_f32_le(),
            rot_y: buf.get_f32_le(),
            timestamp_rtt: buf.get_u32_le(),
        },
        Command::Move => Packet::Move {
            user_id: buf.get_u8(),
            direction: buf.get_u8(),
            speed: buf.get_f32_le(),
        },
        Command::MoveRtt => Packet::MoveRtt {
            user_id: buf.get_u8(),
            direction: buf.get_u8(),
            speed: buf.get_f32_le(),
            timestamp_rtt: buf.get_u32_le(),
        },
        Command::DefaultRtt => Packet::DefaultRtt {
            timestamp_rtt: buf.get_u32_le(),
        },
        Command::UserAssignment => Packet::UserAssignment {
            user_id: buf.get_u8(),
        },
        Command::PortRequest => Packet::PortRequest,
        Command::PortAssignment => Packet::PortAssignment {
            user_id: buf.get_u8(),
            port: buf.get_u16_le(),
        },
    };

    Ok(packet)
}

/// Serializes a [`Packet`] into exactly its declared wire size.
pub fn encode(packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::with_capacity(Packet::wire_size(packet.command()));
    buf.put_u8(packet.command() as u8);

    match *packet {
        Packet::Position {
            user_id,
            x,
            y,
            z,
            rot_y,
        } => {
            buf.put_u8(user_id);
            buf.put_f32_le(x);
            buf.put_f32_le(y);
            buf.put_f32_le(z);
            buf.put_f32_le(rot_y);
        }
        Packet::PositionRtt {
            user_id,
            x,
            y,
            z,
            rot_y,
            timestamp_rtt,
        } => {
            buf.put_u8(user_id);
            buf.put_f32_le(x);
            buf.put_f32_le(y);
            buf.put_f32_le(z);
            buf.put_f32_le(rot_y);
            buf.put_u32_le(timestamp_rtt);
        }
        Packet::Move {
            user_id,
            direction,
            speed,
        } => {
            buf.put_u8(user_id);
            buf.put_u8(direction);
            buf.put_f32_le(speed);
        }
        Packet::MoveRtt {
            user_id,
            direction,
            speed,
            timestamp_rtt,
        } => {
            buf.put_u8(user_id);
            buf.put_u8(direction);
            buf.put_f32_le(speed);
            buf.put_u32_le(timestamp_rtt);
        }
        Packet::DefaultRtt { timestamp_rtt } => {
            buf.put_u32_le(timestamp_rtt);
        }
        Packet::UserAssignment { user_id } => {
            buf.put_u8(user_id);
        }
        Packet::PortRequest => {}
        Packet::PortAssignment { user_id, port } => {
            buf.put_u8(user_id);
            buf.put_u16_le(port);
        }
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    fn sample_packets() -> Vec<Packet> {
        vec![
            Packet::Position {
                user_id: 0,
                x: 0.0,
                y: -1.5,
                z: 1024.25,
                rot_y: 359.9,
            },
            Packet::PositionRtt {
                user_id: 255,
                x: f32::MAX,
                y: f32::MIN,
                z: -0.001,
                rot_y: 180.0,
                timestamp_rtt: u32::MAX,
            },
            Packet::Move {
                user_id: 17,
                direction: Direction::SouthWest as u8,
                speed: 4.5,
            },
            Packet::MoveRtt {
                user_id: 1,
                direction: Direction::NorthWest as u8,
                speed: -12.75,
                timestamp_rtt: 0,
            },
            Packet::DefaultRtt {
                timestamp_rtt: 123456789,
            },
            Packet::UserAssignment { user_id: 42 },
            Packet::PortRequest,
            Packet::PortAssignment {
                user_id: 7,
                port: 0,
            },
            Packet::PortAssignment {
                user_id: 255,
                port: 65535,
            },
        ]
    }

    #[test]
    fn test_roundtrip_all_variants() {
        for packet in sample_packets() {
            let encoded = encode(&packet);
            assert_eq!(encoded.len(), Packet::wire_size(packet.command()));
            assert_eq!(decode(&encoded).unwrap(), packet);
        }
    }

    #[test]
    fn test_command_byte_leads_every_encoding() {
        for packet in sample_packets() {
            let encoded = encode(&packet);
            assert_eq!(encoded[0], packet.command() as u8);
        }
    }

    #[test]
    fn test_truncation_of_every_strict_prefix() {
        for packet in sample_packets() {
            let encoded = encode(&packet);
            let expected = encoded.len();

            for cut in 1..expected {
                match decode(&encoded[..cut]) {
                    Err(ProtocolError::TruncatedMessage {
                        command,
                        expected: e,
                        received,
                    }) => {
                        assert_eq!(command, packet.command());
                        assert_eq!(e, expected);
                        assert_eq!(received, cut);
                    }
                    other => panic!(
                        "expected truncation error for {} at {} bytes, got {:?}",
                        packet.command(),
                        cut,
                        other
                    ),
                }
            }
        }
    }

    #[test]
    fn test_decode_empty_datagram() {
        assert_eq!(decode(&[]), Err(ProtocolError::EmptyDatagram));
    }

    #[test]
    fn test_decode_unknown_command() {
        assert_eq!(decode(&[8, 0, 0, 0]), Err(ProtocolError::UnknownCommand(8)));
        assert_eq!(decode(&[255]), Err(ProtocolError::UnknownCommand(255)));
    }

    #[test]
    fn test_decode_passes_out_of_range_direction_through() {
        let mut encoded = encode(&Packet::Move {
            user_id: 1,
            direction: Direction::North as u8,
            speed: 1.0,
        });
        encoded[2] = 9;

        match decode(&encoded).unwrap() {
            Packet::Move { direction, .. } => {
                assert_eq!(direction, 9);
                assert_eq!(Direction::label(direction), "Unknown");
            }
            other => panic!("expected Move, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_ignores_trailing_bytes() {
        let mut encoded = encode(&Packet::UserAssignment { user_id: 3 });
        encoded.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(
            decode(&encoded).unwrap(),
            Packet::UserAssignment { user_id: 3 }
        );
    }

    #[test]
    fn test_little_endian_layout() {
        let encoded = encode(&Packet::PortAssignment {
            user_id: 9,
            port: 0x1234,
        });
        assert_eq!(encoded, vec![7, 9, 0x34, 0x12]);

        let encoded = encode(&Packet::DefaultRtt {
            timestamp_rtt: 0x01020304,
        });
        assert_eq!(encoded, vec![4, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_position_rtt_layout() {
        let encoded = encode(&Packet::PositionRtt {
            user_id: 5,
            x: 1.0,
            y: 2.0,
            z: 3.0,
            rot_y: 4.0,
            timestamp_rtt: 7,
        });

        assert_eq!(encoded.len(), 22);
        assert_eq!(encoded[0], Command::PositionRtt as u8);
        assert_eq!(encoded[1], 5);
        assert_eq!(&encoded[2..6], &1.0f32.to_le_bytes());
        assert_eq!(&encoded[6..10], &2.0f32.to_le_bytes());
        assert_eq!(&encoded[10..14], &3.0f32.to_le_bytes());
        assert_eq!(&encoded[14..18], &4.0f32.to_le_bytes());
        assert_eq!(&encoded[18..22], &7u32.to_le_bytes());
    }

    #[test]
    fn test_port_request_is_single_byte() {
        assert_eq!(encode(&Packet::PortRequest), vec![6]);
        assert_eq!(decode(&[6]).unwrap(), Packet::PortRequest);
    }
}
