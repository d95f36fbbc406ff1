//! mh-core: Session core for the MayHost terminal client
//!
//! This crate owns everything between the terminal and the wire: the client
//! configuration, the session state machine and command history, the
//! reconnection policy, and the Socket.IO transport.

pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod history;
pub mod reconnect;
pub mod session;
pub mod transport;
pub mod types;

pub use controller::{is_authentication_failure, SessionController, Transition};
pub use error::{ConfigError, ConnectionError, SessionError};
pub use event::PeerEvent;
pub use history::History;
pub use session::{Session, Token};
pub use transport::{ConnectOptions, SocketIoTransport, Transport};
pub use types::{ConnectionStatus, DisconnectReason, FailureCause};
