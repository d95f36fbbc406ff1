//! Command history

/// Ordered list of submitted commands with a navigation cursor.
///
/// A command equal to the immediately preceding entry is not stored again;
/// non-consecutive repeats are kept. The cursor ranges over `0..=len`, where
/// `len` means "past the newest entry" (a fresh input line).
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
}

impl History {
    /// Create an empty history
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command and move the cursor past the newest entry.
    ///
    /// Returns `true` if the command was appended.
    pub fn record(&mut self, command: &str) -> bool {
        let appended = self.entries.last().map(String::as_str) != Some(command);
        if appended {
            self.entries.push(command.to_string());
        }
        self.cursor = self.entries.len();
        appended
    }

    /// Step back to an older entry
    pub fn previous(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return self.entries.first().map(String::as_str);
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step forward to a newer entry.
    ///
    /// Returns `None` once the cursor moves past the newest entry.
    pub fn next(&mut self) -> Option<&str> {
        if self.cursor < self.entries.len() {
            self.cursor += 1;
        }
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Whether the cursor is past the newest entry
    pub fn at_end(&self) -> bool {
        self.cursor == self.entries.len()
    }

    /// Move the cursor past the newest entry
    pub fn reset_cursor(&mut self) {
        self.cursor = self.entries.len();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consecutive_duplicates_are_collapsed() {
        let mut history = History::new();
        assert!(history.record("ls"));
        assert!(!history.record("ls"));
        assert!(history.record("pwd"));
        assert!(history.record("ls"));

        assert_eq!(history.entries(), &["ls", "pwd", "ls"]);
    }

    #[test]
    fn test_navigation() {
        let mut history = History::new();
        history.record("one");
        history.record("two");
        assert!(history.at_end());

        assert_eq!(history.previous(), Some("two"));
        assert_eq!(history.previous(), Some("one"));
        // Stays on the oldest entry
        assert_eq!(history.previous(), Some("one"));

        assert_eq!(history.next(), Some("two"));
        assert_eq!(history.next(), None);
        assert!(history.at_end());
        assert_eq!(history.next(), None);
    }

    #[test]
    fn test_record_resets_cursor() {
        let mut history = History::new();
        history.record("one");
        history.record("two");
        history.previous();
        history.previous();

        history.record("two");
        assert!(history.at_end());
        assert_eq!(history.previous(), Some("two"));
    }

    #[test]
    fn test_empty_history_navigation() {
        let mut history = History::new();
        assert_eq!(history.previous(), None);
        assert_eq!(history.next(), None);
        assert!(history.is_empty());
    }
}
