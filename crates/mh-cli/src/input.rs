//! Blocking terminal readers feeding the application loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INPUT_CHANNEL_CAPACITY: usize = 256;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Raw input delivered to the application loop
#[derive(Debug)]
pub enum RawInput {
    /// Key press from a raw-mode terminal
    Key(KeyEvent),
    /// Complete line from non-interactive input
    Line(String),
    /// Input closed
    Eof,
}

/// Background reader on a blocking thread
pub struct InputReader {
    rx: mpsc::Receiver<RawInput>,
    stop: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl InputReader {
    /// Read key events from a terminal in raw mode
    pub fn keys() -> Self {
        Self::spawn(|tx, stop| {
            while !stop.load(Ordering::Relaxed) {
                let ready = match event::poll(POLL_INTERVAL) {
                    Ok(ready) => ready,
                    Err(e) => {
                        tracing::error!("Failed to poll terminal events: {}", e);
                        let _ = tx.blocking_send(RawInput::Eof);
                        break;
                    }
                };
                if !ready {
                    continue;
                }
                match event::read() {
                    Ok(Event::Key(key)) => {
                        if tx.blocking_send(RawInput::Key(key)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("Failed to read terminal event: {}", e);
                        let _ = tx.blocking_send(RawInput::Eof);
                        break;
                    }
                }
            }
        })
    }

    /// Read whole lines from stdin when it is not a terminal
    pub fn lines() -> Self {
        Self::spawn(|tx, stop| {
            let stdin = std::io::stdin();
            let mut line = String::new();
            while !stop.load(Ordering::Relaxed) {
                line.clear();
                match stdin.read_line(&mut line) {
                    Ok(0) => {
                        let _ = tx.blocking_send(RawInput::Eof);
                        break;
                    }
                    Ok(_) => {
                        let text = line.trim_end_matches(|c| c == '\r' || c == '\n');
                        if tx.blocking_send(RawInput::Line(text.to_string())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!("Failed to read from stdin: {}", e);
                        let _ = tx.blocking_send(RawInput::Eof);
                        break;
                    }
                }
            }
        })
    }

    fn spawn<F>(read: F) -> Self
    where
        F: FnOnce(mpsc::Sender<RawInput>, Arc<AtomicBool>) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let task = tokio::task::spawn_blocking(move || read(tx, flag));
        Self { rx, stop, task }
    }

    pub async fn recv(&mut self) -> Option<RawInput> {
        self.rx.recv().await
    }

    /// Ask the reader thread to finish
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.task.abort();
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop();
    }
}
