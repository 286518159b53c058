use ropey::Rope;

use crate::host::Editor;
use crate::model::cursor::Position;

/// A markdown buffer backed by a rope.
///
/// Reference [`Editor`] implementation for standalone hosts and tests;
/// real hosts adapt their own buffer type instead.
pub struct RopeBuffer {
    rope: Rope,
    cursor: Position,
    dirty: bool,
}

impl RopeBuffer {
    /// Create a new empty buffer.
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            cursor: Position::default(),
            dirty: false,
        }
    }

    /// Create a buffer from existing document text.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Position::default(),
            dirty: false,
        }
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the text of a specific line (without trailing newline).
    pub fn line_text(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(idx);
        let mut s: String = line.chunks().collect();
        if s.ends_with('\n') {
            s.pop();
        }
        if s.ends_with('\r') {
            s.pop();
        }
        Some(s)
    }

    /// Whether the buffer has been modified since creation.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Ensure the cursor stays within valid bounds.
    fn clamp_cursor(&mut self) {
        let max_row = self.rope.len_lines().saturating_sub(1);
        self.cursor.row = self.cursor.row.min(max_row);

        let line_len = self
            .line_text(self.cursor.row)
            .map(|l| l.chars().count())
            .unwrap_or(0);
        self.cursor.col = self.cursor.col.min(line_len);
    }
}

impl Default for RopeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor for RopeBuffer {
    fn text(&self) -> String {
        self.rope.to_string()
    }

    fn cursor(&self) -> Position {
        self.cursor
    }

    fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.dirty = true;
        self.clamp_cursor();
    }

    fn set_cursor(&mut self, pos: Position) {
        self.cursor = pos;
        self.clamp_cursor();
    }
}
