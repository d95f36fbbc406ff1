//! Core domain types

use std::fmt;

/// Why a session ended for good
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The server rejected the token; retrying cannot help
    Authentication,
    /// Every reconnection attempt failed
    ReconnectExhausted,
    /// The connection ended and reconnection is disabled
    ConnectionClosed,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureCause::Authentication => write!(f, "authentication failed"),
            FailureCause::ReconnectExhausted => write!(f, "reconnection attempts exhausted"),
            FailureCause::ConnectionClosed => write!(f, "connection closed"),
        }
    }
}

/// Connection status of the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No connection and none being attempted
    #[default]
    Disconnected,
    /// Initial connection attempt in progress
    Connecting,
    /// Handshake complete; commands can be submitted
    Connected,
    /// Connection lost, automatic reconnection in progress
    Reconnecting,
    /// Session is over
    Failed(FailureCause),
}

impl ConnectionStatus {
    /// Whether commands can be submitted
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Reconnecting => write!(f, "reconnecting"),
            ConnectionStatus::Failed(cause) => write!(f, "failed ({})", cause),
        }
    }
}

/// Why an established connection went away.
///
/// The display strings match the reasons reported by Socket.IO clients so
/// that operators see familiar messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The server closed the namespace
    ServerDisconnect,
    /// We closed the connection
    ClientDisconnect,
    /// No heartbeat from the server in time
    PingTimeout,
    /// The WebSocket closed
    TransportClose,
    /// The WebSocket failed
    TransportError,
}

impl DisconnectReason {
    /// Whether the connection loss was requested locally
    pub fn is_client_initiated(&self) -> bool {
        matches!(self, DisconnectReason::ClientDisconnect)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            DisconnectReason::ServerDisconnect => "io server disconnect",
            DisconnectReason::ClientDisconnect => "io client disconnect",
            DisconnectReason::PingTimeout => "ping timeout",
            DisconnectReason::TransportClose => "transport close",
            DisconnectReason::TransportError => "transport error",
        };
        f.write_str(reason)
    }
}
