//! Session controller
//!
//! Owns the [`Session`] and the transport. All session mutation goes through
//! here: `configure`, `connect`, `submit`, `record_history`, `disconnect`
//! and `apply`, which folds peer events into the session state.

use crate::config::ClientConfig;
use crate::error::SessionError;
use crate::event::PeerEvent;
use crate::history::History;
use crate::session::{Session, Token};
use crate::transport::{ConnectOptions, Transport};
use crate::types::{ConnectionStatus, FailureCause};
use mh_protocol::{AuthPayload, ConnectErrorInfo, COMMAND_EVENT};

/// Error codes that mark a connect error as a credential problem
const AUTH_ERROR_CODES: [&str; 4] = ["AUTH_FAILED", "UNAUTHORIZED", "INVALID_TOKEN", "FORBIDDEN"];

/// Message keywords checked when the server sends no error code
const AUTH_ERROR_KEYWORDS: [&str; 2] = ["authentication", "token"];

/// What the caller should do after an event has been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep going
    Continue,
    /// The session cannot recover
    Terminate(FailureCause),
}

/// Whether a namespace refusal means the token was rejected.
///
/// A structured `data.code` decides when present; otherwise the message is
/// searched for credential keywords. Both comparisons ignore case. Only
/// server refusals are classified; local connection failures never are.
pub fn is_authentication_failure(error: &ConnectErrorInfo) -> bool {
    if let Some(code) = error.code() {
        return AUTH_ERROR_CODES
            .iter()
            .any(|known| known.eq_ignore_ascii_case(code));
    }

    let message = error.message.to_lowercase();
    AUTH_ERROR_KEYWORDS
        .iter()
        .any(|keyword| message.contains(keyword))
}

/// Connection lifecycle and command submission for one session
pub struct SessionController<T: Transport> {
    transport: T,
    config: ClientConfig,
    session: Session,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            transport,
            config,
            session: Session::default(),
        }
    }

    /// Store the server address and token for the next `connect`
    pub fn configure(&mut self, server_url: impl Into<String>, token: Token) {
        self.session.server_url = server_url.into();
        self.session.token = token;
    }

    /// Start connecting; the outcome arrives later as a peer event
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let options = ConnectOptions {
            url: self.session.server_url.clone(),
            auth: AuthPayload {
                token: self.session.token.expose_secret().to_string(),
            },
            reconnect: self.config.reconnect.clone(),
            connect_timeout: self.config.connect_timeout,
        };

        tracing::info!("Connecting to {}", self.session.server_url);
        self.session.status = ConnectionStatus::Connecting;
        self.transport.open(options).await?;
        Ok(())
    }

    /// Send a command line to the peer without waiting for a reply
    pub async fn submit(&mut self, command: &str) -> Result<(), SessionError> {
        if !self.session.status.is_connected() {
            return Err(SessionError::NotConnected);
        }

        tracing::debug!("Submitting command ({} bytes)", command.len());
        self.transport.emit(COMMAND_EVENT, command).await?;
        Ok(())
    }

    /// Tear down the connection. Safe to call more than once.
    pub async fn disconnect(&mut self) {
        self.transport.close().await;
        self.session.status = ConnectionStatus::Disconnected;
        self.session.socket_id = None;
    }

    /// Append a command to the history unless it repeats the last entry
    pub fn record_history(&mut self, command: &str) -> bool {
        self.session.history.record(command)
    }

    /// History access for line editing
    pub fn history_mut(&mut self) -> &mut History {
        &mut self.session.history
    }

    /// Fold a peer event into the session state
    pub fn apply(&mut self, event: &PeerEvent) -> Transition {
        match event {
            PeerEvent::Connected { socket_id } => {
                self.session.status = ConnectionStatus::Connected;
                self.session.socket_id = Some(socket_id.clone());
                Transition::Continue
            }
            PeerEvent::Disconnected { reason } => {
                self.session.socket_id = None;
                if reason.is_client_initiated() {
                    self.session.status = ConnectionStatus::Disconnected;
                    Transition::Continue
                } else {
                    self.connection_lost()
                }
            }
            PeerEvent::ConnectError(error) => {
                if is_authentication_failure(error) {
                    tracing::warn!("Server rejected the token: {}", error.message);
                    self.fail(FailureCause::Authentication)
                } else {
                    self.connection_lost()
                }
            }
            PeerEvent::SessionAssigned(info) => {
                self.session.display_name = non_empty(&info.username);
                self.session.session_id = non_empty(&info.session_id);
                Transition::Continue
            }
            PeerEvent::ConnectFailed(_) => self.connection_lost(),
            PeerEvent::ReconnectError(_) => {
                self.session.status = ConnectionStatus::Reconnecting;
                Transition::Continue
            }
            PeerEvent::ReconnectExhausted => self.fail(FailureCause::ReconnectExhausted),
            PeerEvent::Output(_) | PeerEvent::Reconnected { .. } => Transition::Continue,
        }
    }

    fn connection_lost(&mut self) -> Transition {
        if self.config.reconnect.enabled {
            self.session.status = ConnectionStatus::Reconnecting;
            Transition::Continue
        } else {
            self.fail(FailureCause::ConnectionClosed)
        }
    }

    fn fail(&mut self, cause: FailureCause) -> Transition {
        self.session.status = ConnectionStatus::Failed(cause);
        Transition::Terminate(cause)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
