//! mh-protocol: Wire packets for the MayHost terminal client
//!
//! This crate defines the text packets exchanged with a Socket.IO v4 server
//! over a WebSocket. Each WebSocket text frame carries one Engine.IO packet;
//! Engine.IO `message` packets in turn carry one Socket.IO packet.

pub mod engine;
pub mod error;
pub mod message;
pub mod packet;

pub use engine::{EnginePacket, EnginePacketType, Handshake, ENGINE_IO_VERSION};
pub use error::ProtocolError;
pub use message::{
    AuthPayload, ConnectAck, ConnectErrorInfo, ServerEvent, SessionInfo, COMMAND_EVENT,
    OUTPUT_EVENT, SESSION_EVENT,
};
pub use packet::{SocketPacket, SocketPacketType, DEFAULT_NAMESPACE};
