//! Engine.IO v4 packets
//!
//! Over the WebSocket transport every text frame is exactly one packet: a
//! single ASCII digit identifying the packet type, followed by its payload.
//!
//! # Packet Flow
//!
//! 1. Server sends `Open` with the handshake parameters
//! 2. Server sends `Ping` every `pingInterval`, client answers with `Pong`
//! 3. Application data travels inside `Message` packets (see `packet.rs`)
//! 4. Either side may send `Close`

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

/// Engine.IO protocol revision sent in the `EIO` query parameter.
pub const ENGINE_IO_VERSION: u8 = 4;

/// Handshake parameters carried by the `Open` packet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    /// Engine.IO session id
    pub sid: String,
    /// Transports the server could upgrade to
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Interval between server pings, in milliseconds
    pub ping_interval: u64,
    /// Grace period after a missed ping, in milliseconds
    pub ping_timeout: u64,
    /// Maximum payload size accepted by the server
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// How long the client may go without hearing from the server
    /// before the connection is considered dead.
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// Engine.IO packet type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePacketType {
    Open,
    Close,
    Ping,
    Pong,
    Message,
    Upgrade,
    Noop,
}

impl EnginePacketType {
    /// Wire character for this packet type
    pub fn as_char(&self) -> char {
        match self {
            Self::Open => '0',
            Self::Close => '1',
            Self::Ping => '2',
            Self::Pong => '3',
            Self::Message => '4',
            Self::Upgrade => '5',
            Self::Noop => '6',
        }
    }

    /// Parse a wire character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Open),
            '1' => Some(Self::Close),
            '2' => Some(Self::Ping),
            '3' => Some(Self::Pong),
            '4' => Some(Self::Message),
            '5' => Some(Self::Upgrade),
            '6' => Some(Self::Noop),
            _ => None,
        }
    }
}

/// A decoded Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    /// Handshake from the server
    Open(Handshake),
    /// Transport close
    Close,
    /// Heartbeat ping (payload is echoed back in the pong)
    Ping(String),
    /// Heartbeat pong
    Pong(String),
    /// Application payload (an encoded Socket.IO packet)
    Message(String),
    /// Transport upgrade
    Upgrade,
    /// No-op
    Noop,
}

impl EnginePacket {
    /// Get the packet type
    pub fn packet_type(&self) -> EnginePacketType {
        match self {
            EnginePacket::Open(_) => EnginePacketType::Open,
            EnginePacket::Close => EnginePacketType::Close,
            EnginePacket::Ping(_) => EnginePacketType::Ping,
            EnginePacket::Pong(_) => EnginePacketType::Pong,
            EnginePacket::Message(_) => EnginePacketType::Message,
            EnginePacket::Upgrade => EnginePacketType::Upgrade,
            EnginePacket::Noop => EnginePacketType::Noop,
        }
    }

    /// Decode a packet from a WebSocket text frame
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut chars = text.chars();
        let first = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let kind = EnginePacketType::from_char(first)
            .ok_or(ProtocolError::UnknownPacketType(first))?;
        let payload = chars.as_str();

        let packet = match kind {
            EnginePacketType::Open => EnginePacket::Open(serde_json::from_str(payload)?),
            EnginePacketType::Close => EnginePacket::Close,
            EnginePacketType::Ping => EnginePacket::Ping(payload.to_string()),
            EnginePacketType::Pong => EnginePacket::Pong(payload.to_string()),
            EnginePacketType::Message => EnginePacket::Message(payload.to_string()),
            EnginePacketType::Upgrade => EnginePacket::Upgrade,
            EnginePacketType::Noop => EnginePacket::Noop,
        };
        Ok(packet)
    }

    /// Encode the packet into a WebSocket text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let mut out = String::new();
        out.push(self.packet_type().as_char());
        match self {
            EnginePacket::Open(handshake) => out.push_str(&serde_json::to_string(handshake)?),
            EnginePacket::Ping(data) | EnginePacket::Pong(data) | EnginePacket::Message(data) => {
                out.push_str(data)
            }
            EnginePacket::Close | EnginePacket::Upgrade | EnginePacket::Noop => {}
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_open() {
        let text = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let packet = EnginePacket::decode(text).unwrap();

        match packet {
            EnginePacket::Open(handshake) => {
                assert_eq!(handshake.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(handshake.max_payload, Some(1_000_000));
                assert_eq!(handshake.heartbeat_deadline(), Duration::from_secs(45));
            }
            other => panic!("expected open packet, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_heartbeat_and_message() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping(String::new()));
        assert_eq!(
            EnginePacket::decode(r#"42["output","hi"]"#).unwrap(),
            EnginePacket::Message(r#"2["output","hi"]"#.to_string())
        );
        assert_eq!(EnginePacket::decode("1").unwrap(), EnginePacket::Close);
    }

    #[test]
    fn test_encode_pong_echoes_payload() {
        let pong = EnginePacket::Pong("probe".to_string());
        assert_eq!(pong.encode().unwrap(), "3probe");
        assert_eq!(EnginePacket::Pong(String::new()).encode().unwrap(), "3");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            EnginePacket::decode(""),
            Err(ProtocolError::EmptyPacket)
        ));
        assert!(matches!(
            EnginePacket::decode("9abc"),
            Err(ProtocolError::UnknownPacketType('9'))
        ));
        assert!(matches!(
            EnginePacket::decode("0{not json"),
            Err(ProtocolError::Json(_))
        ));
    }
}
