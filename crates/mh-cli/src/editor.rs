//! Single-line editor with history recall

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use mh_core::History;

/// Result of feeding one key to the editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorAction {
    /// Nothing visible changed
    None,
    /// The line or cursor changed and must be redrawn
    Redraw,
    /// Enter was pressed; the line is handed over and the buffer cleared
    Submit(String),
    /// Ctrl+C
    Interrupt,
    /// Ctrl+D on an empty line
    Eof,
}

/// Line buffer with a cursor, measured in characters
#[derive(Debug, Default)]
pub struct LineEditor {
    buffer: Vec<char>,
    cursor: usize,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents of the line
    pub fn line(&self) -> String {
        self.buffer.iter().collect()
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn handle_key(&mut self, key: KeyEvent, history: &mut History) -> EditorAction {
        if key.kind == KeyEventKind::Release {
            return EditorAction::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.set("");
                history.reset_cursor();
                EditorAction::Interrupt
            }
            KeyCode::Char('d') if ctrl => {
                if self.buffer.is_empty() {
                    EditorAction::Eof
                } else {
                    self.delete()
                }
            }
            KeyCode::Char('a') if ctrl => self.move_to(0),
            KeyCode::Char('e') if ctrl => self.move_to(self.buffer.len()),
            KeyCode::Char('u') if ctrl => {
                self.buffer.drain(..self.cursor);
                self.cursor = 0;
                EditorAction::Redraw
            }
            KeyCode::Char(_) if ctrl => EditorAction::None,
            KeyCode::Char(c) => {
                self.buffer.insert(self.cursor, c);
                self.cursor += 1;
                EditorAction::Redraw
            }
            KeyCode::Enter => {
                let line = self.line();
                self.set("");
                history.reset_cursor();
                EditorAction::Submit(line)
            }
            KeyCode::Backspace => {
                if self.cursor == 0 {
                    return EditorAction::None;
                }
                self.cursor -= 1;
                self.buffer.remove(self.cursor);
                EditorAction::Redraw
            }
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_to(self.cursor.saturating_sub(1)),
            KeyCode::Right => self.move_to((self.cursor + 1).min(self.buffer.len())),
            KeyCode::Home => self.move_to(0),
            KeyCode::End => self.move_to(self.buffer.len()),
            KeyCode::Up => match history.previous() {
                Some(entry) => {
                    self.set(entry);
                    EditorAction::Redraw
                }
                None => EditorAction::None,
            },
            KeyCode::Down => {
                if history.at_end() {
                    return EditorAction::None;
                }
                let entry = history.next().unwrap_or("");
                self.set(entry);
                EditorAction::Redraw
            }
            _ => EditorAction::None,
        }
    }

    fn set(&mut self, line: &str) {
        self.buffer = line.chars().collect();
        self.cursor = self.buffer.len();
    }

    fn delete(&mut self) -> EditorAction {
        if self.cursor >= self.buffer.len() {
            return EditorAction::None;
        }
        self.buffer.remove(self.cursor);
        EditorAction::Redraw
    }

    fn move_to(&mut self, position: usize) -> EditorAction {
        if position == self.cursor {
            return EditorAction::None;
        }
        self.cursor = position;
        EditorAction::Redraw
    }
}
