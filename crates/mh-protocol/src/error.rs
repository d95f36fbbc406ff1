//! Protocol error types

use thiserror::Error;

/// Errors that can occur while decoding or encoding packets
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Empty frame received
    #[error("Empty packet")]
    EmptyPacket,

    /// Unknown Engine.IO or Socket.IO packet type
    #[error("Unknown packet type: {0:?}")]
    UnknownPacketType(char),

    /// Binary attachments are not supported by this client
    #[error("Binary packets are not supported")]
    BinaryUnsupported,

    /// Packet structure is invalid
    #[error("Malformed packet: {0}")]
    Malformed(String),

    /// Packet was valid but not expected at this point of the exchange
    #[error("Unexpected packet: {0}")]
    Unexpected(String),

    /// JSON payload error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
