/// Cursor position within a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// Line (0-indexed).
    pub row: usize,
    /// Column (0-indexed, char offset within the line).
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Convert to a flat char offset into `text`, clamping to valid bounds.
    ///
    /// A format rewrite replaces the whole buffer, so the cursor travels
    /// through it as a flat offset rather than a line/column pair.
    pub fn to_offset(self, text: &str) -> usize {
        let mut offset = 0;
        for (row, line) in text.split('\n').enumerate() {
            let line_chars = line.chars().count();
            if row == self.row {
                return offset + self.col.min(line_chars);
            }
            offset += line_chars + 1;
        }
        text.chars().count()
    }

    /// Convert a flat char offset back into a line/column position.
    ///
    /// Offsets past the end of `text` clamp to the final position. An
    /// offset landing on a newline maps to the end of that line.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut remaining = offset;
        let mut row = 0;
        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            let line_chars = line.chars().count();
            if remaining <= line_chars || lines.peek().is_none() {
                return Self {
                    row,
                    col: remaining.min(line_chars),
                };
            }
            remaining -= line_chars + 1;
            row += 1;
        }
        Self::default()
    }
}
