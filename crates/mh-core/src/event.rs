//! Events raised by the transport

use mh_protocol::{ConnectErrorInfo, SessionInfo};

use crate::types::DisconnectReason;

/// Everything the peer (or the connection to it) can tell the client.
///
/// Transports push these into a single channel; the application loop handles
/// them one at a time, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// Handshake complete; `socket_id` is the id assigned by the server
    Connected { socket_id: String },
    /// An established connection was lost
    Disconnected { reason: DisconnectReason },
    /// The server refused the namespace connection
    ConnectError(ConnectErrorInfo),
    /// The initial connection attempt failed before reaching the server's
    /// namespace (bad address, network error, timeout)
    ConnectFailed(String),
    /// Command output
    Output(String),
    /// Session details pushed by the server
    SessionAssigned(SessionInfo),
    /// Connection re-established after `attempts` attempts
    Reconnected { attempts: u32 },
    /// A reconnection attempt failed
    ReconnectError(String),
    /// Every reconnection attempt failed
    ReconnectExhausted,
}
