//! Typed application messages
//!
//! The server speaks a small set of named Socket.IO events:
//!
//! - `output` (server → client): a chunk of command output, as a string
//! - `session` (server → client): `{ username, sessionId }` once authenticated
//! - `command` (client → server): the raw command line typed by the operator
//!
//! Authentication happens in the namespace CONNECT packet, whose payload is
//! [`AuthPayload`]. The server answers with a [`ConnectAck`] or refuses with a
//! [`ConnectErrorInfo`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::packet::SocketPacket;

/// Server → client command output
pub const OUTPUT_EVENT: &str = "output";

/// Server → client session assignment
pub const SESSION_EVENT: &str = "session";

/// Client → server command submission
pub const COMMAND_EVENT: &str = "command";

/// Auth payload sent with the namespace CONNECT packet
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPayload {
    pub token: String,
}

impl std::fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthPayload")
            .field("token", &"***")
            .finish()
    }
}

impl AuthPayload {
    pub fn to_value(&self) -> Value {
        serde_json::json!({ "token": self.token })
    }
}

/// Successful namespace connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectAck {
    /// Socket id assigned by the server
    pub sid: String,
}

/// Namespace connection refused by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectErrorInfo {
    /// Human-readable reason
    pub message: String,
    /// Optional structured details (`{ "code": "..." }` by convention)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ConnectErrorInfo {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Structured error code, when the server supplies one
    pub fn code(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|d| d.get("code"))
            .and_then(Value::as_str)
    }

    /// Parse the payload of a CONNECT_ERROR packet.
    ///
    /// Older servers send a bare string instead of an object.
    pub fn from_packet(packet: &SocketPacket) -> Self {
        match &packet.data {
            Some(Value::String(message)) => Self::new(message.clone()),
            Some(value) => serde_json::from_value(value.clone())
                .unwrap_or_else(|_| Self::new(value.to_string())),
            None => Self::new("connection refused"),
        }
    }
}

/// Session details pushed by the server after authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub username: String,
    #[serde(default, rename = "sessionId")]
    pub session_id: String,
}

/// Events the server can push to the client
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Command output
    Output(String),
    /// Session assignment
    Session(SessionInfo),
    /// Any event this client does not know about
    Other { name: String, args: Vec<Value> },
}

impl ServerEvent {
    /// Interpret an EVENT packet
    pub fn from_packet(packet: &SocketPacket) -> Result<Self, ProtocolError> {
        let (name, args) = packet.event_parts()?;
        let first = args.first();

        let event = match name {
            OUTPUT_EVENT => ServerEvent::Output(match first {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            }),
            SESSION_EVENT => {
                let value = first.cloned().unwrap_or(Value::Null);
                ServerEvent::Session(serde_json::from_value(value)?)
            }
            _ => ServerEvent::Other {
                name: name.to_string(),
                args: args.to_vec(),
            },
        };
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::SocketPacketType;
    use serde_json::json;

    #[test]
    fn test_output_event() {
        let packet = SocketPacket::decode(r#"2["output","total 0\n"]"#).unwrap();
        assert_eq!(
            ServerEvent::from_packet(&packet).unwrap(),
            ServerEvent::Output("total 0\n".to_string())
        );

        // Non-string output is rendered as JSON text
        let packet = SocketPacket::decode(r#"2["output",{"code":1}]"#).unwrap();
        assert_eq!(
            ServerEvent::from_packet(&packet).unwrap(),
            ServerEvent::Output(r#"{"code":1}"#.to_string())
        );
    }

    #[test]
    fn test_session_event() {
        let packet =
            SocketPacket::decode(r#"2["session",{"username":"alice","sessionId":"s1"}]"#).unwrap();
        assert_eq!(
            ServerEvent::from_packet(&packet).unwrap(),
            ServerEvent::Session(SessionInfo {
                username: "alice".to_string(),
                session_id: "s1".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_event_is_preserved() {
        let packet = SocketPacket::decode(r#"2["motd","hello",3]"#).unwrap();
        assert_eq!(
            ServerEvent::from_packet(&packet).unwrap(),
            ServerEvent::Other {
                name: "motd".to_string(),
                args: vec![json!("hello"), json!(3)],
            }
        );
    }

    #[test]
    fn test_connect_error_shapes() {
        let packet = SocketPacket::decode(
            r#"4{"message":"Authentication failed","data":{"code":"INVALID_TOKEN"}}"#,
        )
        .unwrap();
        assert_eq!(packet.kind, SocketPacketType::ConnectError);
        let info = ConnectErrorInfo::from_packet(&packet);
        assert_eq!(info.message, "Authentication failed");
        assert_eq!(info.code(), Some("INVALID_TOKEN"));

        let packet = SocketPacket::decode(r#"4"Invalid namespace""#).unwrap();
        let info = ConnectErrorInfo::from_packet(&packet);
        assert_eq!(info.message, "Invalid namespace");
        assert_eq!(info.code(), None);
    }

    #[test]
    fn test_auth_payload_debug_is_redacted() {
        let auth = AuthPayload {
            token: "super-secret".to_string(),
        };
        assert!(!format!("{:?}", auth).contains("super-secret"));
        assert_eq!(auth.to_value(), json!({ "token": "super-secret" }));
    }
}
