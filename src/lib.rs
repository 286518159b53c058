//! notefmt: format-on-save markdown plugin for note editors.
//!
//! The plugin wires a cursor-preserving markdown formatter into a host
//! editor's lifecycle behind a small trait boundary: a `format-document`
//! command, an optional hook in front of the host's save command, and a
//! one-toggle settings surface.
//!
//! Hosts implement [`host::Editor`], [`host::HostContext`],
//! [`host::CommandRegistry`] and [`host::SettingsStore`], then call
//! [`FormatPlugin::activate`]. Formatting itself sits behind the
//! [`FormatEngine`] trait; the default [`MarkdownEngine`] normalizes
//! markdown and delegates fenced code blocks to per-language plugins.

pub mod engine;
pub mod error;
pub mod host;
pub mod model;
pub mod plugin;

pub use engine::{FormatEngine, FormatOutcome, FormatRequest, MarkdownEngine};
pub use error::{FormatError, PluginError};
pub use model::cursor::Position;
pub use model::settings::PluginSettings;
pub use plugin::FormatPlugin;
