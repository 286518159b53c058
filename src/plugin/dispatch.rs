//! The format dispatcher: one editor read, one engine call, one write.

use crate::engine::{FormatEngine, FormatRequest};
use crate::error::FormatError;
use crate::host::Editor;
use crate::model::cursor::Position;

/// Format the whole document in `editor`, preserving the cursor.
///
/// The buffer is written exactly once, and only after the engine has
/// fully succeeded; on failure the editor is left untouched.
pub fn format_document(
    editor: &mut dyn Editor,
    engine: &dyn FormatEngine,
) -> Result<(), FormatError> {
    let text = editor.text();
    let cursor_offset = editor.cursor().to_offset(&text);

    let outcome = engine.format_with_cursor(FormatRequest {
        text: &text,
        cursor_offset,
    })?;

    editor.set_text(&outcome.text);
    editor.set_cursor(Position::from_offset(&outcome.text, outcome.cursor_offset));
    tracing::debug!(
        "formatted document: {} -> {} chars",
        text.chars().count(),
        outcome.text.chars().count()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MarkdownEngine;

    /// Editor that counts writes, to pin down the one-atomic-write contract.
    struct ProbeEditor {
        text: String,
        cursor: Position,
        writes: usize,
    }

    impl ProbeEditor {
        fn new(text: &str, cursor: Position) -> Self {
            Self {
                text: text.to_string(),
                cursor,
                writes: 0,
            }
        }
    }

    impl Editor for ProbeEditor {
        fn text(&self) -> String {
            self.text.clone()
        }

        fn cursor(&self) -> Position {
            self.cursor
        }

        fn set_text(&mut self, text: &str) {
            self.text = text.to_string();
            self.writes += 1;
        }

        fn set_cursor(&mut self, pos: Position) {
            self.cursor = pos;
        }
    }

    #[test]
    fn writes_once_and_restores_the_cursor() {
        let mut editor = ProbeEditor::new("# Title\n\n*  item\n", Position::new(2, 1));
        format_document(&mut editor, &MarkdownEngine::new()).unwrap();

        assert_eq!(editor.text, "# Title\n\n- item\n");
        assert_eq!(editor.writes, 1);
        assert_eq!(editor.cursor, Position::new(2, 1));
    }

    #[test]
    fn failure_leaves_buffer_and_cursor_untouched() {
        let text = "```json\n{nope\n```\n";
        let mut editor = ProbeEditor::new(text, Position::new(1, 2));

        let err = format_document(&mut editor, &MarkdownEngine::new()).unwrap_err();
        assert!(matches!(err, FormatError::Fence { .. }));
        assert_eq!(editor.text, text);
        assert_eq!(editor.writes, 0);
        assert_eq!(editor.cursor, Position::new(1, 2));
    }
}
