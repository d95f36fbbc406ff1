//! Core error types for the MayHost client

use mh_protocol::ProtocolError;
use std::path::PathBuf;
use thiserror::Error;

/// Connection-related errors
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Server address could not be turned into a WebSocket endpoint
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),

    /// Handshake did not complete within the connect timeout
    #[error("Connection timed out")]
    Timeout,

    /// Connection lost
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// WebSocket-level failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed traffic from the server
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The transport was already opened
    #[error("Transport already open")]
    AlreadyOpen,
}

/// Session-related errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// A remote command was submitted while not connected
    #[error("Not connected to the server")]
    NotConnected,

    /// The transport failed to accept the command
    #[error("Transport error: {0}")]
    Transport(#[from] ConnectionError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}
