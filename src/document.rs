//! The editor surface: a text buffer plus a caret.
//!
//! The document is the only owner of the buffer. Every mutation (and every
//! caret move) records a change notice tagged with its origin; the main loop
//! drains those notices and forwards them to the suggestion coordinator.
//! Tagging lets the coordinator tell user typing apart from its own splices,
//! so accepting a suggestion does not re-trigger a fetch.

use std::collections::VecDeque;

/// Origin of a buffer or caret change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    /// Typed or navigated by the user.
    User,
    /// Programmatic edit, e.g. splicing in an accepted suggestion.
    System,
}

/// A mutable text buffer with a caret.
///
/// The caret is a byte offset into the buffer and always sits on a `char`
/// boundary, with `0 <= caret <= buffer.len()`.
#[derive(Debug, Default)]
pub struct Document {
    buffer: String,
    caret: usize,
    changes: VecDeque<EditOrigin>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from existing text, caret at the end.
    pub fn from_text(text: String) -> Self {
        let caret = text.len();
        Self {
            buffer: text,
            caret,
            changes: VecDeque::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    /// The text from the start of the buffer up to the caret.
    pub fn prompt(&self) -> &str {
        &self.buffer[..self.caret]
    }

    /// Drain all pending change notices, oldest first.
    pub fn drain_changes(&mut self) -> Vec<EditOrigin> {
        self.changes.drain(..).collect()
    }

    fn record(&mut self, origin: EditOrigin) {
        self.changes.push_back(origin);
    }

    /// Replace the entire buffer, moving the caret to the end.
    pub fn set_text(&mut self, text: String) {
        self.caret = text.len();
        self.buffer = text;
        self.record(EditOrigin::User);
    }

    /// Replace the word currently being typed with `token` and a trailing
    /// space, leaving the caret right after the space.
    ///
    /// The word starts just after the nearest space or newline before the
    /// caret (or at the start of the buffer). Records a `System` notice.
    pub fn replace_current_word(&mut self, token: &str) {
        let word_start = self
            .prompt()
            .rfind([' ', '\n'])
            .map(|i| i + 1)
            .unwrap_or(0);

        let mut next = String::with_capacity(self.buffer.len() + token.len() + 1);
        next.push_str(&self.buffer[..word_start]);
        next.push_str(token);
        next.push(' ');
        next.push_str(&self.buffer[self.caret..]);

        self.buffer = next;
        self.caret = word_start + token.len() + 1;
        self.record(EditOrigin::System);
    }

    pub fn insert_char(&mut self, c: char) {
        self.buffer.insert(self.caret, c);
        self.caret += c.len_utf8();
        self.record(EditOrigin::User);
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.buffer.remove(prev);
            self.caret = prev;
            self.record(EditOrigin::User);
        }
    }

    pub fn delete(&mut self) {
        if self.caret < self.buffer.len() {
            self.buffer.remove(self.caret);
            self.record(EditOrigin::User);
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.caret = prev;
            self.record(EditOrigin::User);
        }
    }

    pub fn move_right(&mut self) {
        if let Some(c) = self.buffer[self.caret..].chars().next() {
            self.caret += c.len_utf8();
            self.record(EditOrigin::User);
        }
    }

    pub fn move_line_start(&mut self) {
        let start = self.line_start(self.caret);
        if start != self.caret {
            self.caret = start;
            self.record(EditOrigin::User);
        }
    }

    pub fn move_line_end(&mut self) {
        let end = self.line_end(self.caret);
        if end != self.caret {
            self.caret = end;
            self.record(EditOrigin::User);
        }
    }

    pub fn move_up(&mut self) {
        let line_start = self.line_start(self.caret);
        if line_start == 0 {
            return;
        }
        let column = self.buffer[line_start..self.caret].chars().count();
        let prev_start = self.line_start(line_start - 1);
        self.caret = self.offset_at_column(prev_start, column);
        self.record(EditOrigin::User);
    }

    pub fn move_down(&mut self) {
        let line_start = self.line_start(self.caret);
        let line_end = self.line_end(self.caret);
        if line_end == self.buffer.len() {
            return;
        }
        let column = self.buffer[line_start..self.caret].chars().count();
        self.caret = self.offset_at_column(line_end + 1, column);
        self.record(EditOrigin::User);
    }

    /// Move the caret to `column` characters into the line containing
    /// `line_start`, clamped to the line end.
    fn offset_at_column(&self, line_start: usize, column: usize) -> usize {
        let line_end = self.line_end(line_start);
        self.buffer[line_start..line_end]
            .char_indices()
            .nth(column)
            .map(|(i, _)| line_start + i)
            .unwrap_or(line_end)
    }

    /// Byte offset of the start of the line containing `pos`.
    fn line_start(&self, pos: usize) -> usize {
        self.buffer[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }

    /// Byte offset of the end of the line containing `pos` (the `\n`, or the
    /// buffer end).
    fn line_end(&self, pos: usize) -> usize {
        self.buffer[pos..]
            .find('\n')
            .map(|i| pos + i)
            .unwrap_or(self.buffer.len())
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.buffer[..self.caret]
            .chars()
            .next_back()
            .map(|c| self.caret - c.len_utf8())
    }

    /// Move the caret to `line` (0-based) and `column` characters into that
    /// line, both clamped. Used for mouse positioning.
    pub fn move_to(&mut self, line: usize, column: usize) {
        let mut start = 0;
        for _ in 0..line {
            match self.buffer[start..].find('\n') {
                Some(i) => start += i + 1,
                None => break,
            }
        }
        let target = self.offset_at_column(start, column);
        if target != self.caret {
            self.caret = target;
            self.record(EditOrigin::User);
        }
    }
}
