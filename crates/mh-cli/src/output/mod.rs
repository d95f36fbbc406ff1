//! Output formatting utilities for the CLI
//!
//! Status and help text, the startup banner, and colored, symbol-prefixed
//! messages. Every helper works both in cooked mode and while the terminal
//! is in raw mode, where a bare `\n` would not return the cursor.

use crossterm::style::{Color, Print, ResetColor, SetForegroundColor, Stylize};
use std::io::Write;

use mh_core::Session;

/// Horizontal rule used by the banner and the connection notice
pub const SEPARATOR: &str = "═══════════════════════════════════════════════════════════";

const BANNER_ART: &str = r"
 __  __             _   _           _
|  \/  | __ _ _   _| | | | ___  ___| |_
| |\/| |/ _` | | | | |_| |/ _ \/ __| __|
| |  | | (_| | |_| |  _  | (_) \__ \ |_
|_|  |_|\__,_|\__, |_| |_|\___/|___/\__|
              |___/
";

/// Kind of message, which decides its color and prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Error,
    Warning,
    Info,
    /// Progress notices
    Muted,
    /// No color, no prefix
    Plain,
}

impl Tone {
    fn color(&self) -> Option<Color> {
        match self {
            Tone::Success => Some(Color::Green),
            Tone::Error => Some(Color::Red),
            Tone::Warning => Some(Color::Yellow),
            Tone::Info => Some(Color::Cyan),
            Tone::Muted => Some(Color::DarkGrey),
            Tone::Plain => None,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            Tone::Success => "✓ ",
            Tone::Error => "✗ ",
            Tone::Warning => "⚠ ",
            Tone::Info => "ℹ ",
            Tone::Muted | Tone::Plain => "",
        }
    }

    /// Errors and warnings go to stderr
    fn uses_stderr(&self) -> bool {
        matches!(self, Tone::Error | Tone::Warning)
    }
}

/// Line ending for the current terminal mode
pub fn newline() -> &'static str {
    if crossterm::terminal::is_raw_mode_enabled().unwrap_or(false) {
        "\r\n"
    } else {
        "\n"
    }
}

/// Convert line endings in multi-line text for the current terminal mode
pub fn normalize_newlines(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    match newline() {
        "\n" => text,
        ending => text.replace('\n', ending),
    }
}

/// Print a message with the tone's color and prefix
pub fn print_message(tone: Tone, msg: &str) {
    let msg = normalize_newlines(msg);
    if tone.uses_stderr() {
        write_message(&mut std::io::stderr(), tone, &msg);
    } else {
        write_message(&mut std::io::stdout(), tone, &msg);
    }
}

fn write_message(out: &mut impl Write, tone: Tone, msg: &str) {
    let _ = match tone.color() {
        Some(color) => crossterm::execute!(
            out,
            SetForegroundColor(color),
            Print(tone.symbol()),
            Print(msg),
            ResetColor,
            Print(newline())
        ),
        None => crossterm::execute!(out, Print(msg), Print(newline())),
    };
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr with red coloring for error feedback to the user.
pub fn print_error(msg: &str) {
    print_message(Tone::Error, msg);
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    print_message(Tone::Info, msg);
}

/// Print the startup banner
pub fn print_banner() {
    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        Print(BANNER_ART.red().bold()),
        Print("\n"),
        Print(SEPARATOR.yellow()),
        Print("\n"),
        Print(
            format!(
                "  MayHost terminal client v{}\n",
                env!("CARGO_PKG_VERSION")
            )
            .cyan()
        ),
        Print("  Available 24/7 ♣\n".green()),
        Print(SEPARATOR.yellow()),
        Print("\n\n")
    );
}

/// Command reference shown by `help`
pub fn help_text() -> String {
    [
        "📖 Available commands:",
        "  help     - Show this help",
        "  clear    - Clear the screen",
        "  status   - Show connection status",
        "  soporte  - Support information",
        "  exit     - Leave the terminal",
        "  quit     - Leave the terminal",
        "",
        "💡 Anything else is sent to the remote server",
    ]
    .join("\n")
}

/// Format the session as shown by `status`
pub fn format_status(session: &Session) -> String {
    let mut output = String::new();

    output.push_str("📊 Client status:\n");
    output.push_str(&format!("  URL: {}\n", session.server_url()));
    output.push_str(&format!("  State: {}\n", session.status()));
    output.push_str(&format!(
        "  User: {}\n",
        session.display_name().unwrap_or("N/A")
    ));
    output.push_str(&format!(
        "  Session ID: {}\n",
        session.session_id().unwrap_or("N/A")
    ));
    output.push_str(&format!(
        "  Socket ID: {}\n",
        session.socket_id().unwrap_or("N/A")
    ));
    output.push_str(&format!(
        "  Commands in history: {}",
        session.history().len()
    ));

    output
}
