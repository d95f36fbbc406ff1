//! Socket.IO v4 packets
//!
//! A Socket.IO packet is carried inside an Engine.IO `message` packet and is
//! encoded as:
//!
//! ```text
//! <type>[<attachments>-][<namespace>,][<ack id>][<json payload>]
//! ```
//!
//! The namespace is omitted for the default namespace `/`.

use serde_json::Value;

use crate::error::ProtocolError;

/// Namespace used when the server URL has no path
pub const DEFAULT_NAMESPACE: &str = "/";

/// Socket.IO packet type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SocketPacketType {
    /// Namespace connection request / acknowledgment
    Connect = 0,
    /// Namespace disconnection
    Disconnect = 1,
    /// Named event with arguments
    Event = 2,
    /// Acknowledgment of an event
    Ack = 3,
    /// Namespace connection refused
    ConnectError = 4,
    /// Event with binary attachments
    BinaryEvent = 5,
    /// Ack with binary attachments
    BinaryAck = 6,
}

impl SocketPacketType {
    /// Wire character for this packet type
    pub fn as_char(&self) -> char {
        char::from(b'0' + *self as u8)
    }

    /// Parse a wire character
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '0' => Some(Self::Connect),
            '1' => Some(Self::Disconnect),
            '2' => Some(Self::Event),
            '3' => Some(Self::Ack),
            '4' => Some(Self::ConnectError),
            '5' => Some(Self::BinaryEvent),
            '6' => Some(Self::BinaryAck),
            _ => None,
        }
    }
}

/// A decoded Socket.IO packet
#[derive(Debug, Clone, PartialEq)]
pub struct SocketPacket {
    pub kind: SocketPacketType,
    pub namespace: String,
    pub id: Option<u64>,
    pub data: Option<Value>,
}

impl SocketPacket {
    /// Namespace connection request carrying the auth payload
    pub fn connect(namespace: &str, auth: Value) -> Self {
        Self {
            kind: SocketPacketType::Connect,
            namespace: namespace.to_string(),
            id: None,
            data: Some(auth),
        }
    }

    /// Client-initiated namespace disconnection
    pub fn disconnect(namespace: &str) -> Self {
        Self {
            kind: SocketPacketType::Disconnect,
            namespace: namespace.to_string(),
            id: None,
            data: None,
        }
    }

    /// Named event; the payload is `[name, ...args]`
    pub fn event(namespace: &str, name: &str, args: Vec<Value>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(Value::String(name.to_string()));
        items.extend(args);
        Self {
            kind: SocketPacketType::Event,
            namespace: namespace.to_string(),
            id: None,
            data: Some(Value::Array(items)),
        }
    }

    /// Split an event payload into its name and arguments
    pub fn event_parts(&self) -> Result<(&str, &[Value]), ProtocolError> {
        if self.kind != SocketPacketType::Event {
            return Err(ProtocolError::Unexpected(format!(
                "expected event packet, got {:?}",
                self.kind
            )));
        }
        let items = self
            .data
            .as_ref()
            .and_then(Value::as_array)
            .ok_or_else(|| ProtocolError::Malformed("event payload is not an array".into()))?;
        let (name, args) = items
            .split_first()
            .ok_or_else(|| ProtocolError::Malformed("event payload is empty".into()))?;
        let name = name
            .as_str()
            .ok_or_else(|| ProtocolError::Malformed("event name is not a string".into()))?;
        Ok((name, args))
    }

    /// Decode a packet from the payload of an Engine.IO message
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let mut chars = text.chars();
        let first = chars.next().ok_or(ProtocolError::EmptyPacket)?;
        let kind =
            SocketPacketType::from_char(first).ok_or(ProtocolError::UnknownPacketType(first))?;
        if matches!(
            kind,
            SocketPacketType::BinaryEvent | SocketPacketType::BinaryAck
        ) {
            return Err(ProtocolError::BinaryUnsupported);
        }

        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            match rest.find(',') {
                Some(end) => {
                    let ns = &rest[..end];
                    rest = &rest[end + 1..];
                    ns.to_string()
                }
                None => {
                    let ns = rest.to_string();
                    rest = "";
                    ns
                }
            }
        } else {
            DEFAULT_NAMESPACE.to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            let parsed = rest[..digits]
                .parse::<u64>()
                .map_err(|e| ProtocolError::Malformed(format!("invalid ack id: {}", e)))?;
            rest = &rest[digits..];
            Some(parsed)
        } else {
            None
        };

        let data = if rest.is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        Ok(Self {
            kind,
            namespace,
            id,
            data,
        })
    }

    /// Encode the packet for an Engine.IO message
    pub fn encode(&self) -> Result<String, ProtocolError> {
        let mut out = String::new();
        out.push(self.kind.as_char());
        if self.namespace != DEFAULT_NAMESPACE && !self.namespace.is_empty() {
            out.push_str(&self.namespace);
            out.push(',');
        }
        if let Some(id) = self.id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = &self.data {
            out.push_str(&serde_json::to_string(data)?);
        }
        Ok(out)
    }
}
