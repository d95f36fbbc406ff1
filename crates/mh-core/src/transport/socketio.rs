//! Socket.IO v4 client over a WebSocket
//!
//! Only the WebSocket transport is spoken; there is no HTTP long-polling
//! phase and no upgrade. A background task owns the socket, answers
//! heartbeats, forwards server events and runs the reconnection schedule.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use super::{ConnectOptions, Transport, PEER_EVENT_CHANNEL_CAPACITY};
use crate::error::ConnectionError;
use crate::event::PeerEvent;
use crate::reconnect::ReconnectBackoff;
use crate::types::DisconnectReason;
use mh_protocol::{
    AuthPayload, ConnectAck, ConnectErrorInfo, EnginePacket, ProtocolError, ServerEvent,
    SocketPacket, SocketPacketType, DEFAULT_NAMESPACE, ENGINE_IO_VERSION,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Events queued while the connection is down are sent after it comes back
const OUTGOING_CHANNEL_CAPACITY: usize = 64;

/// How long `close` waits for the namespace disconnect to go out
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Socket.IO transport backed by `tokio-tungstenite`
///
/// A transport opens once. Its event sender moves into the driver task, so
/// the receiver sees the channel close when that task ends.
pub struct SocketIoTransport {
    events: Option<mpsc::Sender<PeerEvent>>,
    outgoing: Option<mpsc::Sender<Outgoing>>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

/// An event waiting to be written to the socket
#[derive(Debug)]
struct Outgoing {
    event: String,
    payload: String,
}

impl SocketIoTransport {
    /// Create a transport and the receiver for its events
    pub fn new() -> (Self, mpsc::Receiver<PeerEvent>) {
        let (events, rx) = mpsc::channel(PEER_EVENT_CHANNEL_CAPACITY);
        let transport = Self {
            events: Some(events),
            outgoing: None,
            cancel: CancellationToken::new(),
            task: None,
        };
        (transport, rx)
    }
}

#[async_trait]
impl Transport for SocketIoTransport {
    async fn open(&mut self, options: ConnectOptions) -> Result<(), ConnectionError> {
        if self.task.is_some() {
            return Err(ConnectionError::AlreadyOpen);
        }
        let events = self.events.take().ok_or(ConnectionError::AlreadyOpen)?;

        let (outgoing_tx, outgoing_rx) = mpsc::channel(OUTGOING_CHANNEL_CAPACITY);
        self.cancel = CancellationToken::new();
        self.outgoing = Some(outgoing_tx);

        let driver = Driver {
            options,
            events,
            outgoing: outgoing_rx,
            cancel: self.cancel.clone(),
        };
        self.task = Some(tokio::spawn(driver.run()));
        Ok(())
    }

    async fn emit(&mut self, event: &str, payload: &str) -> Result<(), ConnectionError> {
        let outgoing = self
            .outgoing
            .as_ref()
            .ok_or_else(|| ConnectionError::ConnectionLost("transport is not open".to_string()))?;

        outgoing
            .try_send(Outgoing {
                event: event.to_string(),
                payload: payload.to_string(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => {
                    ConnectionError::ConnectionLost("send buffer is full".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    ConnectionError::ConnectionLost("transport task has stopped".to_string())
                }
            })
    }

    async fn close(&mut self) {
        self.cancel.cancel();
        self.outgoing = None;

        if let Some(mut task) = self.task.take() {
            if tokio::time::timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
                tracing::debug!("Transport task did not stop in time, aborting");
                task.abort();
            }
        }
    }
}

impl Drop for SocketIoTransport {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// WebSocket URL and Socket.IO namespace derived from a server address
#[derive(Debug, Clone, PartialEq)]
struct Endpoint {
    url: Url,
    namespace: String,
}

impl Endpoint {
    /// Addresses without a scheme are assumed to be `https://`.
    fn parse(address: &str) -> Result<Self, ConnectionError> {
        let address = address.trim();
        let lower = address.to_ascii_lowercase();
        let has_scheme = ["http://", "https://", "ws://", "wss://"]
            .iter()
            .any(|scheme| lower.starts_with(scheme));
        let full = if has_scheme {
            address.to_string()
        } else {
            format!("https://{}", address)
        };

        let mut url = Url::parse(&full)
            .map_err(|e| ConnectionError::InvalidAddress(format!("{}: {}", address, e)))?;

        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(ConnectionError::InvalidAddress(format!(
                    "unsupported scheme '{}'",
                    other
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| ConnectionError::InvalidAddress(address.to_string()))?;

        let path = url.path().trim_end_matches('/');
        let namespace = if path.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            path.to_string()
        };

        // Keep the operator's query parameters
        let extra: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| key != "EIO" && key != "transport")
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();

        url.set_path("/socket.io/");
        url.set_query(None);
        if !extra.is_empty() {
            url.query_pairs_mut().extend_pairs(&extra);
        }
        url.query_pairs_mut()
            .append_pair("EIO", &ENGINE_IO_VERSION.to_string())
            .append_pair("transport", "websocket");
        url.set_fragment(None);

        Ok(Self { url, namespace })
    }
}

/// Why a single connection attempt failed
#[derive(Debug)]
enum AttemptError {
    /// The server refused the namespace connection
    Refused(ConnectErrorInfo),
    /// Anything else
    Failed(ConnectionError),
}

impl From<ConnectionError> for AttemptError {
    fn from(err: ConnectionError) -> Self {
        AttemptError::Failed(err)
    }
}

impl From<ProtocolError> for AttemptError {
    fn from(err: ProtocolError) -> Self {
        AttemptError::Failed(err.into())
    }
}

impl From<WsError> for AttemptError {
    fn from(err: WsError) -> Self {
        AttemptError::Failed(err.into())
    }
}

/// A connected socket with a completed Socket.IO handshake
struct Connection {
    ws: WsStream,
    namespace: String,
    socket_id: String,
    heartbeat_deadline: Duration,
}

/// Background task that owns the socket
struct Driver {
    options: ConnectOptions,
    events: mpsc::Sender<PeerEvent>,
    outgoing: mpsc::Receiver<Outgoing>,
    cancel: CancellationToken,
}

impl Driver {
    async fn run(mut self) {
        let mut backoff = ReconnectBackoff::from_config(&self.options.reconnect);
        let mut reconnecting = false;

        loop {
            let attempt = tokio::select! {
                _ = self.cancel.cancelled() => return,
                result = connect_once(&self.options) => result,
            };

            match attempt {
                Ok(connection) => {
                    let attempts = backoff.attempts();
                    backoff.reset();

                    tracing::info!(
                        "Connected to {} (socket id {})",
                        self.options.url,
                        connection.socket_id
                    );
                    self.notify(PeerEvent::Connected {
                        socket_id: connection.socket_id.clone(),
                    })
                    .await;
                    if reconnecting {
                        self.notify(PeerEvent::Reconnected { attempts }).await;
                    }

                    let reason = self.pump(connection).await;
                    tracing::info!("Disconnected: {}", reason);
                    self.notify(PeerEvent::Disconnected { reason }).await;

                    if reason.is_client_initiated() || !self.options.reconnect.enabled {
                        return;
                    }
                }
                Err(AttemptError::Refused(info)) => {
                    tracing::warn!("Server refused connection: {}", info.message);
                    self.notify(PeerEvent::ConnectError(info)).await;
                    if !self.options.reconnect.enabled {
                        return;
                    }
                }
                Err(AttemptError::Failed(e)) => {
                    tracing::warn!("Connection attempt failed: {}", e);
                    if reconnecting {
                        self.notify(PeerEvent::ReconnectError(e.to_string())).await;
                    } else {
                        self.notify(PeerEvent::ConnectFailed(e.to_string())).await;
                        if !self.options.reconnect.enabled {
                            return;
                        }
                    }
                }
            }
            reconnecting = true;

            let Some(delay) = backoff.next_delay() else {
                tracing::warn!("Giving up after {} reconnection attempts", backoff.attempts());
                self.notify(PeerEvent::ReconnectExhausted).await;
                return;
            };
            tracing::debug!("Reconnection attempt {} in {:?}", backoff.attempts(), delay);
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run an established connection until it ends
    async fn pump(&mut self, connection: Connection) -> DisconnectReason {
        let Connection {
            ws,
            namespace,
            heartbeat_deadline,
            ..
        } = connection;
        let (mut sink, mut stream) = ws.split();
        let mut last_seen = Instant::now();

        loop {
            tokio::select! {
                // Queued events go out before a requested disconnect
                biased;

                Some(outgoing) = self.outgoing.recv() => {
                    let packet = SocketPacket::event(
                        &namespace,
                        &outgoing.event,
                        vec![Value::String(outgoing.payload)],
                    );
                    match encode_socket_packet(&packet) {
                        Ok(text) => {
                            if let Err(e) = sink.send(WsMessage::Text(text)).await {
                                tracing::warn!("Failed to send '{}' event: {}", outgoing.event, e);
                                return DisconnectReason::TransportError;
                            }
                        }
                        Err(e) => {
                            tracing::error!("Failed to encode '{}' event: {}", outgoing.event, e)
                        }
                    }
                }

                _ = self.cancel.cancelled() => {
                    if let Ok(text) = encode_socket_packet(&SocketPacket::disconnect(&namespace)) {
                        let _ = sink.send(WsMessage::Text(text)).await;
                    }
                    let _ = sink.close().await;
                    return DisconnectReason::ClientDisconnect;
                }

                _ = tokio::time::sleep_until(last_seen + heartbeat_deadline) => {
                    return DisconnectReason::PingTimeout;
                }

                frame = stream.next() => {
                    let text = match frame {
                        Some(Ok(WsMessage::Text(text))) => text,
                        Some(Ok(WsMessage::Close(_))) | None => {
                            return DisconnectReason::TransportClose
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            tracing::warn!("WebSocket error: {}", e);
                            return DisconnectReason::TransportError;
                        }
                    };
                    last_seen = Instant::now();

                    let packet = match EnginePacket::decode(&text) {
                        Ok(packet) => packet,
                        Err(e) => {
                            tracing::warn!("Ignoring malformed packet: {}", e);
                            continue;
                        }
                    };

                    match packet {
                        EnginePacket::Ping(data) => {
                            let pong = match EnginePacket::Pong(data).encode() {
                                Ok(pong) => pong,
                                Err(e) => {
                                    tracing::error!("Failed to encode pong: {}", e);
                                    continue;
                                }
                            };
                            if let Err(e) = sink.send(WsMessage::Text(pong)).await {
                                tracing::warn!("Failed to answer ping: {}", e);
                                return DisconnectReason::TransportError;
                            }
                        }
                        EnginePacket::Close => return DisconnectReason::TransportClose,
                        EnginePacket::Message(payload) => {
                            if let Some(reason) = self.dispatch(&namespace, &payload).await {
                                return reason;
                            }
                        }
                        other => tracing::trace!("Ignoring {:?} packet", other.packet_type()),
                    }
                }
            }
        }
    }

    /// Handle one Socket.IO packet; returns a reason if the namespace closed
    async fn dispatch(&self, namespace: &str, payload: &str) -> Option<DisconnectReason> {
        let packet = match SocketPacket::decode(payload) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!("Ignoring malformed Socket.IO packet: {}", e);
                return None;
            }
        };
        if packet.namespace != namespace {
            tracing::debug!("Ignoring packet for namespace {}", packet.namespace);
            return None;
        }

        match packet.kind {
            SocketPacketType::Disconnect => Some(DisconnectReason::ServerDisconnect),
            SocketPacketType::Event => {
                match ServerEvent::from_packet(&packet) {
                    Ok(ServerEvent::Output(text)) => self.notify(PeerEvent::Output(text)).await,
                    Ok(ServerEvent::Session(info)) => {
                        tracing::debug!("Session assigned: {}", info.session_id);
                        self.notify(PeerEvent::SessionAssigned(info)).await;
                    }
                    Ok(ServerEvent::Other { name, .. }) => {
                        tracing::debug!("Ignoring unknown event '{}'", name)
                    }
                    Err(e) => tracing::warn!("Ignoring malformed event: {}", e),
                }
                None
            }
            other => {
                tracing::debug!("Ignoring {:?} packet", other);
                None
            }
        }
    }

    async fn notify(&self, event: PeerEvent) {
        if self.events.send(event).await.is_err() {
            tracing::debug!("Peer event receiver dropped");
        }
    }
}

/// Open the WebSocket and complete both handshakes within the connect timeout
async fn connect_once(options: &ConnectOptions) -> Result<Connection, AttemptError> {
    let endpoint = Endpoint::parse(&options.url)?;
    tracing::debug!("Connecting to {}", endpoint.url);

    tokio::time::timeout(options.connect_timeout, handshake(endpoint, &options.auth))
        .await
        .map_err(|_| AttemptError::Failed(ConnectionError::Timeout))?
}

async fn handshake(endpoint: Endpoint, auth: &AuthPayload) -> Result<Connection, AttemptError> {
    let (mut ws, _) = connect_async(endpoint.url.as_str()).await?;

    let heartbeat_deadline = match next_engine_packet(&mut ws).await? {
        EnginePacket::Open(handshake) => {
            tracing::debug!(
                "Engine.IO session {} (ping every {} ms)",
                handshake.sid,
                handshake.ping_interval
            );
            handshake.heartbeat_deadline()
        }
        other => {
            return Err(ProtocolError::Unexpected(format!(
                "expected open packet, got {:?}",
                other.packet_type()
            ))
            .into())
        }
    };

    let connect = SocketPacket::connect(&endpoint.namespace, auth.to_value());
    ws.send(WsMessage::Text(encode_socket_packet(&connect)?)).await?;

    loop {
        match next_engine_packet(&mut ws).await? {
            EnginePacket::Ping(data) => {
                ws.send(WsMessage::Text(EnginePacket::Pong(data).encode()?)).await?;
            }
            EnginePacket::Message(payload) => {
                let packet = SocketPacket::decode(&payload)?;
                if packet.namespace != endpoint.namespace {
                    continue;
                }
                match packet.kind {
                    SocketPacketType::Connect => {
                        let ack: ConnectAck =
                            serde_json::from_value(packet.data.unwrap_or(Value::Null))
                                .map_err(ProtocolError::from)?;
                        return Ok(Connection {
                            ws,
                            namespace: endpoint.namespace,
                            socket_id: ack.sid,
                            heartbeat_deadline,
                        });
                    }
                    SocketPacketType::ConnectError => {
                        return Err(AttemptError::Refused(ConnectErrorInfo::from_packet(&packet)))
                    }
                    other => tracing::debug!("Ignoring {:?} packet before connect", other),
                }
            }
            EnginePacket::Close => {
                return Err(ConnectionError::ConnectionLost(
                    "server closed the connection during the handshake".to_string(),
                )
                .into())
            }
            _ => {}
        }
    }
}

/// Read the next Engine.IO packet, skipping WebSocket control frames
async fn next_engine_packet<S>(stream: &mut S) -> Result<EnginePacket, ConnectionError>
where
    S: Stream<Item = Result<WsMessage, WsError>> + Unpin,
{
    loop {
        match stream.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(EnginePacket::decode(&text)?),
            Some(Ok(WsMessage::Close(_))) | None => {
                return Err(ConnectionError::ConnectionLost("connection closed".to_string()))
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

fn encode_socket_packet(packet: &SocketPacket) -> Result<String, ProtocolError> {
    EnginePacket::Message(packet.encode()?).encode()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_http_address() {
        let endpoint = Endpoint::parse("http://localhost:3000").unwrap();
        assert_eq!(
            endpoint.url.as_str(),
            "ws://localhost:3000/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/");
    }

    #[test]
    fn test_endpoint_https_becomes_wss() {
        let endpoint = Endpoint::parse("https://panel.example.com/").unwrap();
        assert_eq!(endpoint.url.scheme(), "wss");
        assert_eq!(endpoint.namespace, "/");
    }

    #[test]
    fn test_endpoint_path_selects_namespace() {
        let endpoint = Endpoint::parse("http://localhost:3000/terminal/").unwrap();
        assert_eq!(endpoint.namespace, "/terminal");
        assert_eq!(endpoint.url.path(), "/socket.io/");
    }

    #[test]
    fn test_endpoint_without_scheme_defaults_to_wss() {
        let endpoint = Endpoint::parse("  panel.example.com:8443 ").unwrap();
        assert_eq!(
            endpoint.url.as_str(),
            "wss://panel.example.com:8443/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_endpoint_keeps_operator_query() {
        let endpoint = Endpoint::parse("http://localhost:3000/?room=ops&EIO=3").unwrap();
        assert_eq!(
            endpoint.url.as_str(),
            "ws://localhost:3000/socket.io/?room=ops&EIO=4&transport=websocket"
        );
        assert_eq!(endpoint.namespace, "/");
    }

    #[test]
    fn test_endpoint_garbage_is_invalid() {
        assert!(matches!(
            Endpoint::parse("http://"),
            Err(ConnectionError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_encode_socket_packet_wraps_in_message() {
        let packet = SocketPacket::event("/", "command", vec![Value::String("ls".into())]);
        assert_eq!(encode_socket_packet(&packet).unwrap(), r#"42["command","ls"]"#);
    }

    #[tokio::test]
    async fn test_emit_before_open_fails() {
        let (mut transport, _rx) = SocketIoTransport::new();
        assert!(transport.emit("command", "ls").await.is_err());
    }

    #[tokio::test]
    async fn test_open_hands_event_sender_to_driver() {
        let (mut transport, mut rx) = SocketIoTransport::new();
        let options = ConnectOptions {
            url: "http://".to_string(),
            auth: AuthPayload {
                token: "abc".to_string(),
            },
            reconnect: crate::config::ReconnectConfig {
                enabled: false,
                ..Default::default()
            },
            connect_timeout: Duration::from_secs(1),
        };
        transport.open(options).await.unwrap();

        // The driver reports the bad address, stops, and the channel closes
        assert!(matches!(rx.recv().await, Some(PeerEvent::ConnectFailed(_))));
        assert!(rx.recv().await.is_none());
        transport.close().await;
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (mut transport, _rx) = SocketIoTransport::new();
        transport.close().await;
        transport.close().await;
    }
}
