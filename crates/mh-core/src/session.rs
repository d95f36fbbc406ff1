//! Session state

use std::fmt;

use crate::history::History;
use crate::types::ConnectionStatus;

/// Bearer token that never shows up in logs or debug output
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(***)")
    }
}

/// State of the one session this process manages.
///
/// Fields are only mutated through [`crate::SessionController`].
#[derive(Debug, Default)]
pub struct Session {
    pub(crate) server_url: String,
    pub(crate) token: Token,
    pub(crate) status: ConnectionStatus,
    pub(crate) socket_id: Option<String>,
    pub(crate) session_id: Option<String>,
    pub(crate) display_name: Option<String>,
    pub(crate) history: History,
}

impl Session {
    /// Server address as entered by the operator
    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    /// Socket id assigned during the handshake
    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    /// Session id pushed by the server
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// User name pushed by the server
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }
}
