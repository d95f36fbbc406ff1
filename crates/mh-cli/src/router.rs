//! Command router
//!
//! Classifies each submitted line as a local or remote command, renders
//! peer events, and decides when the prompt is shown and when the process
//! ends. Handlers return a [`Flow`]; only `main` exits the process.

use mh_core::{
    ConnectionStatus, DisconnectReason, FailureCause, PeerEvent, SessionController, SessionError,
    Transition, Transport,
};

use crate::console::{Console, Input};
use crate::output::{self, Tone, SEPARATOR};

const SUPPORT_MESSAGE: &str =
    "📞 Need help? Contact your MayHost administrator or open a ticket in the panel.";

const ALWAYS_ON_MESSAGE: &str = "♣ Available 24/7 ♣";

/// Exit code for a double interrupt
pub const EXIT_INTERRUPTED: i32 = 130;

/// What the application loop should do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(i32),
}

/// Keywords handled without contacting the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCommand {
    Exit,
    Clear,
    Help,
    Status,
    Support,
    AlwaysOn,
}

/// Classified input line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Empty,
    Local(LocalCommand),
    /// Trimmed line to forward to the server
    Remote(&'a str),
}

/// Classify a line; keywords are matched case-insensitively
pub fn classify(line: &str) -> Command<'_> {
    let command = line.trim();
    if command.is_empty() {
        return Command::Empty;
    }

    let local = match command.to_lowercase().as_str() {
        "exit" | "quit" => LocalCommand::Exit,
        "clear" => LocalCommand::Clear,
        "help" => LocalCommand::Help,
        "status" => LocalCommand::Status,
        "soporte" => LocalCommand::Support,
        "24/7" => LocalCommand::AlwaysOn,
        _ => return Command::Remote(command),
    };
    Command::Local(local)
}

pub struct Router<T: Transport, C: Console> {
    pub(crate) controller: SessionController<T>,
    pub(crate) console: C,
    /// The first connection has completed and input is being read
    started: bool,
    /// A command was sent and its output has not arrived yet
    awaiting_output: bool,
    /// The previous input was an interrupt
    interrupt_armed: bool,
}

impl<T: Transport, C: Console> Router<T, C> {
    pub fn new(controller: SessionController<T>, console: C) -> Self {
        Self {
            controller,
            console,
            started: false,
            awaiting_output: false,
            interrupt_armed: false,
        }
    }

    /// Whether the interactive session has begun
    pub fn started(&self) -> bool {
        self.started
    }

    /// Whether a dispatched command is still waiting for output
    pub fn awaiting_output(&self) -> bool {
        self.awaiting_output
    }

    pub fn controller(&self) -> &SessionController<T> {
        &self.controller
    }

    pub fn console(&self) -> &C {
        &self.console
    }

    pub async fn handle_input(&mut self, input: Input) -> Flow {
        match input {
            Input::Line(line) => self.handle_line(&line).await,
            Input::Interrupt => self.handle_interrupt().await,
            Input::Eof => self.handle_close().await,
        }
    }

    /// Handle one submitted line
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        self.interrupt_armed = false;

        let command = classify(line);
        if command == Command::Empty {
            self.console.show_prompt();
            return Flow::Continue;
        }
        self.controller.record_history(line.trim());

        match command {
            Command::Empty => Flow::Continue,
            Command::Local(local) => self.run_local(local).await,
            Command::Remote(text) => {
                match self.controller.submit(text).await {
                    Ok(()) => {
                        self.console.message(Tone::Muted, "⏳ Running command...");
                        self.awaiting_output = true;
                    }
                    Err(SessionError::NotConnected) => {
                        self.console.message(Tone::Error, "No connection to the server");
                        self.console.show_prompt();
                    }
                    Err(e) => {
                        tracing::warn!("Command dispatch failed: {}", e);
                        self.console
                            .message(Tone::Error, &format!("Failed to send command: {}", e));
                        self.console.show_prompt();
                    }
                }
                Flow::Continue
            }
        }
    }

    async fn run_local(&mut self, command: LocalCommand) -> Flow {
        tracing::debug!("Local command: {:?}", command);
        match command {
            LocalCommand::Exit => {
                self.console.message(Tone::Warning, "👋 Goodbye!");
                self.shutdown().await;
                return Flow::Exit(0);
            }
            LocalCommand::Clear => self.console.clear(),
            LocalCommand::Help => self.console.message(Tone::Plain, &output::help_text()),
            LocalCommand::Status => {
                let status = output::format_status(self.controller.session());
                self.console.message(Tone::Plain, &status);
            }
            LocalCommand::Support => self.console.message(Tone::Info, SUPPORT_MESSAGE),
            LocalCommand::AlwaysOn => self.console.message(Tone::Success, ALWAYS_ON_MESSAGE),
        }
        self.console.show_prompt();
        Flow::Continue
    }

    /// Fold a peer event into the session and render it
    pub async fn handle_event(&mut self, event: PeerEvent) -> Flow {
        let transition = self.controller.apply(&event);

        let reprompt = match event {
            PeerEvent::Connected { .. } if !self.started => {
                self.console.message(Tone::Success, "Connected to the server");
                self.console
                    .message(Tone::Info, "Type \"help\" to list the available commands");
                self.console.message(Tone::Info, "Type \"exit\" to leave the terminal");
                self.console.message(Tone::Plain, SEPARATOR);
                self.started = true;
                true
            }
            // A reconnection is announced by the `Reconnected` event that follows
            PeerEvent::Connected { .. } => false,
            PeerEvent::Disconnected { reason } => {
                self.console.message(
                    Tone::Error,
                    &format!("Disconnected from the server: {}", reason),
                );
                if reason == DisconnectReason::ServerDisconnect
                    && self.controller.session().status() == ConnectionStatus::Reconnecting
                {
                    self.console.message(Tone::Warning, "🔄 Reconnecting...");
                }
                self.started
            }
            PeerEvent::ConnectError(error) => {
                self.console
                    .message(Tone::Error, &format!("Connection error: {}", error.message));
                self.started
            }
            PeerEvent::ConnectFailed(message) => {
                self.console.message(Tone::Error, &format!("Connection error: {}", message));
                self.started
            }
            PeerEvent::Output(text) => {
                if !text.trim().is_empty() {
                    self.console.output(&text);
                }
                true
            }
            PeerEvent::SessionAssigned(info) => {
                self.console.message(
                    Tone::Info,
                    &format!("📋 Session: {} ({})", info.username, info.session_id),
                );
                self.started
            }
            PeerEvent::Reconnected { attempts } => {
                self.console.message(
                    Tone::Success,
                    &format!("Reconnected after {} attempt(s)", attempts),
                );
                true
            }
            PeerEvent::ReconnectError(message) => {
                self.console
                    .message(Tone::Error, &format!("Reconnection error: {}", message));
                self.started
            }
            PeerEvent::ReconnectExhausted => false,
        };

        match transition {
            Transition::Continue => {
                if reprompt {
                    self.awaiting_output = false;
                    self.console.show_prompt();
                }
                Flow::Continue
            }
            Transition::Terminate(cause) => {
                let reason = match cause {
                    FailureCause::Authentication => "🔒 Authentication failed. Check your token.",
                    FailureCause::ReconnectExhausted => "Could not reconnect to the server",
                    FailureCause::ConnectionClosed => "Connection to the server was closed",
                };
                self.console.message(Tone::Error, reason);
                self.shutdown().await;
                Flow::Exit(1)
            }
        }
    }

    /// Ctrl+C: ask for confirmation, exit on the second one in a row
    pub async fn handle_interrupt(&mut self) -> Flow {
        if self.interrupt_armed {
            self.shutdown().await;
            return Flow::Exit(EXIT_INTERRUPTED);
        }

        self.interrupt_armed = true;
        self.console.message(
            Tone::Warning,
            "👋 Are you sure you want to exit? (press Ctrl+C again to confirm)",
        );
        if self.started {
            self.console.show_prompt();
        }
        Flow::Continue
    }

    /// Input closed
    pub async fn handle_close(&mut self) -> Flow {
        self.console.message(Tone::Warning, "👋 Goodbye!");
        self.shutdown().await;
        Flow::Exit(0)
    }

    /// Report a fatal error and end the session
    pub async fn abort(&mut self, message: &str) -> Flow {
        self.console.message(Tone::Error, message);
        self.shutdown().await;
        Flow::Exit(1)
    }

    /// Close the connection and release the terminal
    pub async fn shutdown(&mut self) {
        self.controller.disconnect().await;
        self.console.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mh_core::config::ClientConfig;
    use mh_core::{ConnectOptions, ConnectionError, Token};
    use mh_protocol::{ConnectErrorInfo, SessionInfo};

    #[derive(Default)]
    struct RecordingTransport {
        emitted: Vec<(String, String)>,
        closed: usize,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn open(&mut self, _options: ConnectOptions) -> Result<(), ConnectionError> {
            Ok(())
        }

        async fn emit(&mut self, event: &str, payload: &str) -> Result<(), ConnectionError> {
            self.emitted.push((event.to_string(), payload.to_string()));
            Ok(())
        }

        async fn close(&mut self) {
            self.closed += 1;
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Entry {
        Message(Tone, String),
        Output(String),
        Clear,
        Prompt,
        Close,
    }

    #[derive(Default)]
    struct RecordingConsole {
        entries: Vec<Entry>,
    }

    impl RecordingConsole {
        fn prompts(&self) -> usize {
            self.entries.iter().filter(|e| **e == Entry::Prompt).count()
        }

        fn has_message(&self, needle: &str) -> bool {
            self.entries
                .iter()
                .any(|e| matches!(e, Entry::Message(_, text) if text.contains(needle)))
        }
    }

    impl Console for RecordingConsole {
        fn message(&mut self, tone: Tone, text: &str) {
            self.entries.push(Entry::Message(tone, text.to_string()));
        }

        fn output(&mut self, text: &str) {
            self.entries.push(Entry::Output(text.to_string()));
        }

        fn clear(&mut self) {
            self.entries.push(Entry::Clear);
        }

        fn show_prompt(&mut self) {
            self.entries.push(Entry::Prompt);
        }

        fn close(&mut self) {
            self.entries.push(Entry::Close);
        }
    }

    type TestRouter = Router<RecordingTransport, RecordingConsole>;

    async fn router() -> TestRouter {
        let mut controller =
            SessionController::new(RecordingTransport::default(), ClientConfig::default());
        controller.configure("http://localhost:3000", Token::new("abc"));
        controller.connect().await.unwrap();
        Router::new(controller, RecordingConsole::default())
    }

    /// Router after a successful handshake, with the console log cleared
    async fn connected_router() -> TestRouter {
        let mut router = router().await;
        router
            .handle_event(PeerEvent::Connected {
                socket_id: "sock-1".to_string(),
            })
            .await;
        router.console.entries.clear();
        router
    }

    fn emitted(router: &TestRouter) -> &[(String, String)] {
        &router.controller().transport().emitted
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("   "), Command::Empty);
        assert_eq!(classify("EXIT"), Command::Local(LocalCommand::Exit));
        assert_eq!(classify(" quit "), Command::Local(LocalCommand::Exit));
        assert_eq!(classify("Clear"), Command::Local(LocalCommand::Clear));
        assert_eq!(classify("help"), Command::Local(LocalCommand::Help));
        assert_eq!(classify("STATUS"), Command::Local(LocalCommand::Status));
        assert_eq!(classify("Soporte"), Command::Local(LocalCommand::Support));
        assert_eq!(classify("24/7"), Command::Local(LocalCommand::AlwaysOn));
        assert_eq!(classify("  ls -la "), Command::Remote("ls -la"));
        assert_eq!(classify("exit now"), Command::Remote("exit now"));
    }

    #[tokio::test]
    async fn test_first_connect_starts_session_with_one_prompt() {
        let mut router = router().await;
        let flow = router
            .handle_event(PeerEvent::Connected {
                socket_id: "sock-1".to_string(),
            })
            .await;

        assert_eq!(flow, Flow::Continue);
        assert!(router.started());
        assert!(router.console().has_message("Connected to the server"));
        assert_eq!(router.console().prompts(), 1);
    }

    #[tokio::test]
    async fn test_remote_command_forwarded_once() {
        let mut router = connected_router().await;
        let flow = router.handle_line("ls -la").await;

        assert_eq!(flow, Flow::Continue);
        assert_eq!(
            emitted(&router),
            &[("command".to_string(), "ls -la".to_string())]
        );
        assert!(router.awaiting_output());
        // The prompt waits for the output
        assert_eq!(router.console().prompts(), 0);
        assert!(router.console().has_message("Running command"));
    }

    #[tokio::test]
    async fn test_output_prints_and_prompts_once() {
        let mut router = connected_router().await;
        router.handle_line("ls").await;

        router
            .handle_event(PeerEvent::Output("total 0".to_string()))
            .await;
        assert!(!router.awaiting_output());
        assert_eq!(router.console().prompts(), 1);
        assert!(router
            .console()
            .entries
            .contains(&Entry::Output("total 0".to_string())));

        // Blank output still prompts, but prints nothing
        router.handle_event(PeerEvent::Output("  \n".to_string())).await;
        assert_eq!(router.console().prompts(), 2);
        assert_eq!(
            router
                .console()
                .entries
                .iter()
                .filter(|e| matches!(e, Entry::Output(_)))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_empty_line_only_prompts() {
        let mut router = connected_router().await;
        router.handle_line("   ").await;

        assert!(emitted(&router).is_empty());
        assert!(router.controller().session().history().is_empty());
        assert_eq!(router.console().entries, vec![Entry::Prompt]);
    }

    #[tokio::test]
    async fn test_history_collapses_consecutive_duplicates() {
        let mut router = connected_router().await;
        for line in ["ls", "ls", "pwd", "ls"] {
            router.handle_line(line).await;
        }

        assert_eq!(
            router.controller().session().history().entries(),
            &["ls", "pwd", "ls"]
        );
        assert_eq!(emitted(&router).len(), 4);
    }

    #[tokio::test]
    async fn test_not_connected_reports_and_keeps_history() {
        let mut router = router().await;
        router.handle_line("uptime").await;

        assert!(emitted(&router).is_empty());
        assert!(router.console().has_message("No connection"));
        assert_eq!(router.console().prompts(), 1);
        assert_eq!(router.controller().session().history().len(), 1);
    }

    #[tokio::test]
    async fn test_local_commands_prompt_once_each() {
        let mut router = connected_router().await;
        for line in ["help", "clear", "status", "soporte", "24/7"] {
            assert_eq!(router.handle_line(line).await, Flow::Continue);
        }

        assert_eq!(router.console().prompts(), 5);
        assert!(router.console().entries.contains(&Entry::Clear));
        assert!(router.console().has_message(ALWAYS_ON_MESSAGE));
        assert!(emitted(&router).is_empty());
        // Local commands are still recorded
        assert_eq!(router.controller().session().history().len(), 5);
    }

    #[tokio::test]
    async fn test_status_shows_session_details() {
        let mut router = connected_router().await;
        router
            .handle_event(PeerEvent::SessionAssigned(SessionInfo {
                username: "alice".to_string(),
                session_id: "s1".to_string(),
            }))
            .await;
        router.handle_line("status").await;

        let status = router
            .console()
            .entries
            .iter()
            .rev()
            .find_map(|e| match e {
                Entry::Message(Tone::Plain, text) => Some(text.clone()),
                _ => None,
            })
            .unwrap();
        assert!(status.contains("http://localhost:3000"));
        assert!(status.contains("State: connected"));
        assert!(status.contains("User: alice"));
        assert!(status.contains("Session ID: s1"));
        assert!(status.contains("Socket ID: sock-1"));
        assert!(status.contains("Commands in history: 1"));
    }

    #[tokio::test]
    async fn test_exit_disconnects_and_closes() {
        let mut router = connected_router().await;
        assert_eq!(router.handle_line("exit").await, Flow::Exit(0));

        assert_eq!(router.controller().transport().closed, 1);
        assert_eq!(router.console().entries.last(), Some(&Entry::Close));
        assert_eq!(
            router.controller().session().status(),
            ConnectionStatus::Disconnected
        );
    }

    #[tokio::test]
    async fn test_input_close_exits_cleanly() {
        let mut router = connected_router().await;
        assert_eq!(router.handle_input(Input::Eof).await, Flow::Exit(0));
        assert_eq!(router.controller().transport().closed, 1);
    }

    #[tokio::test]
    async fn test_single_interrupt_never_exits() {
        let mut router = connected_router().await;
        assert_eq!(router.handle_interrupt().await, Flow::Continue);
        assert!(router.console().has_message("Ctrl+C again"));

        // A submitted line disarms the interrupt
        router.handle_line("").await;
        assert_eq!(router.handle_interrupt().await, Flow::Continue);
        assert_eq!(router.controller().transport().closed, 0);
    }

    #[tokio::test]
    async fn test_double_interrupt_exits_130() {
        let mut router = connected_router().await;
        router.handle_interrupt().await;
        assert_eq!(
            router.handle_interrupt().await,
            Flow::Exit(EXIT_INTERRUPTED)
        );
        assert_eq!(router.controller().transport().closed, 1);
    }

    #[tokio::test]
    async fn test_authentication_error_exits_1() {
        let mut router = router().await;
        let flow = router
            .handle_event(PeerEvent::ConnectError(ConnectErrorInfo::new(
                "Authentication failed: invalid Token",
            )))
            .await;

        assert_eq!(flow, Flow::Exit(1));
        assert!(router.console().has_message("Check your token"));
        assert_eq!(router.controller().transport().closed, 1);
    }

    #[tokio::test]
    async fn test_abort_reports_and_exits_1() {
        let mut router = connected_router().await;
        let flow = router.abort("Connection task stopped unexpectedly").await;

        assert_eq!(flow, Flow::Exit(1));
        assert!(router.console().has_message("stopped unexpectedly"));
        assert_eq!(router.controller().transport().closed, 1);
        assert_eq!(router.console().entries.last(), Some(&Entry::Close));
    }

    #[tokio::test]
    async fn test_connect_failure_before_start_is_reported_without_prompt() {
        let mut router = router().await;
        let flow = router
            .handle_event(PeerEvent::ConnectFailed("Connection timed out".to_string()))
            .await;

        assert_eq!(flow, Flow::Continue);
        assert!(router.console().has_message("Connection error: Connection timed out"));
        assert_eq!(router.console().prompts(), 0);
    }

    #[tokio::test]
    async fn test_reconnection_exhaustion_exits_1() {
        let mut router = connected_router().await;
        router
            .handle_event(PeerEvent::Disconnected {
                reason: DisconnectReason::TransportClose,
            })
            .await;
        for _ in 0..5 {
            let flow = router
                .handle_event(PeerEvent::ReconnectError("refused".to_string()))
                .await;
            assert_eq!(flow, Flow::Continue);
        }

        let flow = router.handle_event(PeerEvent::ReconnectExhausted).await;
        assert_eq!(flow, Flow::Exit(1));
        assert!(router.console().has_message("Could not reconnect"));
    }

    #[tokio::test]
    async fn test_disconnect_notice_releases_pending_prompt() {
        let mut router = connected_router().await;
        router.handle_line("sleep 100").await;
        assert!(router.awaiting_output());

        router
            .handle_event(PeerEvent::Disconnected {
                reason: DisconnectReason::ServerDisconnect,
            })
            .await;
        assert!(!router.awaiting_output());
        assert!(router.console().has_message("io server disconnect"));
        assert!(router.console().has_message("Reconnecting"));
        assert_eq!(router.console().prompts(), 1);

        router
            .handle_event(PeerEvent::Connected {
                socket_id: "sock-2".to_string(),
            })
            .await;
        router
            .handle_event(PeerEvent::Reconnected { attempts: 1 })
            .await;
        assert!(router.console().has_message("Reconnected after 1 attempt"));
        assert_eq!(router.console().prompts(), 2);
    }
}
