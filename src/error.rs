use thiserror::Error;

/// Failures produced by a format engine run.
#[derive(Debug, Error)]
pub enum FormatError {
    /// A fenced code block failed its language plugin's parser.
    #[error("`{language}` code fence does not parse: {message}")]
    Fence { language: String, message: String },

    /// The rewritten text no longer parses to the same document structure.
    #[error("formatting would change the document structure")]
    StructureChanged,
}

/// Failures surfaced by plugin commands and settings plumbing.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("no active markdown editor")]
    NoActiveEditor,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unknown settings toggle: {0}")]
    UnknownToggle(String),
}
