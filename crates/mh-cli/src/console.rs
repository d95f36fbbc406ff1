//! Terminal console
//!
//! The router talks to the terminal only through [`Console`], so it can be
//! driven by a recording console in tests.

use std::io::{stdout, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::event::KeyEvent;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};

use crate::editor::{EditorAction, LineEditor};
use crate::output::{self, Tone};
use mh_core::History;

/// Input for the router, after line editing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    Interrupt,
    Eof,
}

/// Everything the router needs from the terminal
pub trait Console {
    /// Print a notice
    fn message(&mut self, tone: Tone, text: &str);

    /// Print server output verbatim
    fn output(&mut self, text: &str);

    /// Clear the screen
    fn clear(&mut self);

    /// Display the prompt
    fn show_prompt(&mut self);

    /// Release the terminal
    fn close(&mut self);
}

/// Console on the process's terminal
pub struct TerminalConsole {
    prompt: String,
    editor: LineEditor,
    raw: bool,
    prompt_visible: bool,
}

impl TerminalConsole {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            editor: LineEditor::new(),
            raw: false,
            prompt_visible: false,
        }
    }

    /// Switch the terminal to raw mode for key-by-key editing
    pub fn enable_raw_mode(&mut self) -> std::io::Result<()> {
        terminal::enable_raw_mode()?;
        self.raw = true;
        Ok(())
    }

    /// Feed a key to the line editor
    pub fn handle_key(&mut self, key: KeyEvent, history: &mut History) -> Option<Input> {
        match self.editor.handle_key(key, history) {
            EditorAction::None => None,
            EditorAction::Redraw => {
                self.redraw();
                None
            }
            EditorAction::Submit(line) => {
                self.end_line("");
                Some(Input::Line(line))
            }
            EditorAction::Interrupt => {
                self.end_line("^C");
                Some(Input::Interrupt)
            }
            EditorAction::Eof => {
                self.end_line("");
                Some(Input::Eof)
            }
        }
    }

    /// Draw the prompt and the current line, then place the cursor
    fn redraw(&mut self) {
        let line = self.editor.line();
        let column = self.prompt.chars().count() + self.editor.cursor();
        let column = u16::try_from(column).unwrap_or(u16::MAX);

        let mut stdout = stdout();
        let _ = crossterm::execute!(
            stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(self.prompt.as_str().red().bold()),
            Print(line),
            MoveToColumn(column)
        );
        self.prompt_visible = true;
    }

    fn end_line(&mut self, marker: &str) {
        let mut stdout = stdout();
        let _ = write!(stdout, "{}{}", marker, output::newline());
        let _ = stdout.flush();
        self.prompt_visible = false;
    }

    /// Remove a displayed prompt so a notice can take its line
    fn take_prompt_line(&mut self) {
        if self.prompt_visible {
            let mut stdout = stdout();
            let _ = crossterm::execute!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine));
            self.prompt_visible = false;
        }
    }
}

impl Console for TerminalConsole {
    fn message(&mut self, tone: Tone, text: &str) {
        self.take_prompt_line();
        output::print_message(tone, text);
    }

    fn output(&mut self, text: &str) {
        self.take_prompt_line();
        let mut stdout = stdout();
        let _ = write!(
            stdout,
            "{}{}",
            output::normalize_newlines(text),
            output::newline()
        );
        let _ = stdout.flush();
    }

    fn clear(&mut self) {
        let mut stdout = stdout();
        let _ = crossterm::execute!(
            stdout,
            Clear(ClearType::All),
            crossterm::cursor::MoveTo(0, 0)
        );
        self.prompt_visible = false;
    }

    fn show_prompt(&mut self) {
        if self.raw {
            self.redraw();
        } else {
            let mut stdout = stdout();
            let _ = crossterm::execute!(stdout, Print(self.prompt.as_str().red().bold()));
        }
    }

    fn close(&mut self) {
        if self.raw {
            if let Err(e) = terminal::disable_raw_mode() {
                tracing::warn!("Failed to restore terminal: {}", e);
            }
            self.raw = false;
        }
    }
}

impl Drop for TerminalConsole {
    fn drop(&mut self) {
        self.close();
    }
}
