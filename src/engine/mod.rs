//! The formatting seam: an opaque engine contract plus per-language fence
//! plugins for code block interiors.

pub mod fences;
pub mod markdown;

pub use markdown::MarkdownEngine;

use crate::error::FormatError;

/// One formatting call: the full document plus the cursor as a flat char
/// offset.
#[derive(Debug, Clone, Copy)]
pub struct FormatRequest<'a> {
    pub text: &'a str,
    pub cursor_offset: usize,
}

/// Result of a successful format: new text and the cursor remapped into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutcome {
    pub text: String,
    pub cursor_offset: usize,
}

/// A whole-document text formatter with cursor preservation.
///
/// Implementations must be idempotent: formatting already-formatted text
/// returns it unchanged.
pub trait FormatEngine {
    fn format_with_cursor(&self, request: FormatRequest<'_>)
    -> Result<FormatOutcome, FormatError>;
}

/// Formatter for the interior of one fenced code block.
pub trait FencePlugin {
    /// Fence info-string token this plugin owns (lowercase).
    fn language(&self) -> &'static str;

    /// Whether this plugin handles the given fence token.
    fn matches(&self, token: &str) -> bool {
        token.eq_ignore_ascii_case(self.language())
    }

    /// Reformat the fence interior. A parse failure fails the whole
    /// document format.
    fn format(&self, source: &str) -> Result<String, FormatError>;
}
