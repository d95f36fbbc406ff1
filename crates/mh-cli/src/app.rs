//! Application event loop
//!
//! Owns the router and multiplexes its three event sources: peer events
//! from the transport, terminal input, and Ctrl+C. Each event is handled to
//! completion before the next one is taken.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

use mh_core::{PeerEvent, Transport};

use crate::console::TerminalConsole;
use crate::input::{InputReader, RawInput};
use crate::router::{Flow, Router};

/// Run until the router asks to exit; returns the process exit code.
///
/// Input is only read once the first connection completes. `interactive`
/// selects raw-mode line editing over plain line reading.
pub async fn run<T: Transport>(
    mut router: Router<T, TerminalConsole>,
    mut events: mpsc::Receiver<PeerEvent>,
    interactive: bool,
) -> Result<i32> {
    let mut input: Option<InputReader> = None;

    loop {
        let flow = tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if input.is_none() && matches!(event, PeerEvent::Connected { .. }) {
                        input = Some(start_input(&mut router.console, interactive)?);
                    }
                    router.handle_event(event).await
                }
                None => {
                    tracing::error!("Peer event channel closed");
                    router.abort("Connection task stopped unexpectedly").await
                }
            },

            Some(raw) = next_input(&mut input) => match raw {
                RawInput::Key(key) => {
                    match router.console.handle_key(key, router.controller.history_mut()) {
                        Some(edited) => router.handle_input(edited).await,
                        None => Flow::Continue,
                    }
                }
                RawInput::Line(line) => router.handle_line(&line).await,
                RawInput::Eof => router.handle_close().await,
            },

            _ = tokio::signal::ctrl_c() => router.handle_interrupt().await,
        };

        if let Flow::Exit(code) = flow {
            if let Some(reader) = &input {
                reader.stop();
            }
            tracing::debug!("Exiting with code {}", code);
            return Ok(code);
        }
    }
}

fn start_input(console: &mut TerminalConsole, interactive: bool) -> Result<InputReader> {
    if interactive {
        console
            .enable_raw_mode()
            .context("Failed to enable raw terminal mode")?;
        Ok(InputReader::keys())
    } else {
        Ok(InputReader::lines())
    }
}

async fn next_input(reader: &mut Option<InputReader>) -> Option<RawInput> {
    match reader {
        Some(reader) => reader.recv().await,
        None => std::future::pending().await,
    }
}
