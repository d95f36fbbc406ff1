//! Transport abstraction
//!
//! A transport owns the connection to the peer, including reconnection. It
//! reports everything that happens on that connection as
//! [`PeerEvent`](crate::event::PeerEvent)s on the channel handed out when it
//! was created.

mod socketio;

pub use socketio::SocketIoTransport;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ReconnectConfig;
use crate::error::ConnectionError;
use mh_protocol::AuthPayload;

/// Capacity of the peer event channel
pub const PEER_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Everything a transport needs to connect
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Server address as entered by the operator
    pub url: String,
    /// Sent with the namespace CONNECT packet
    pub auth: AuthPayload,
    /// Reconnection policy
    pub reconnect: ReconnectConfig,
    /// Upper bound for each connection attempt
    pub connect_timeout: Duration,
}

/// Bidirectional event channel to the peer
#[async_trait]
pub trait Transport: Send {
    /// Start connecting in the background.
    ///
    /// Returns once the attempt is underway; the outcome arrives later as a
    /// `Connected`, `ConnectError` or `ConnectFailed` event.
    async fn open(&mut self, options: ConnectOptions) -> Result<(), ConnectionError>;

    /// Send a named event with a single string argument
    async fn emit(&mut self, event: &str, payload: &str) -> Result<(), ConnectionError>;

    /// Tear down the connection and stop reconnecting
    async fn close(&mut self);
}
