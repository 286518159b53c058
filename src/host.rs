//! Host boundary: the traits a note editor implements to embed the plugin,
//! plus reference implementations for standalone hosts and tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::error::PluginError;
use crate::model::cursor::Position;

/// Command id of the user-invokable format action.
pub const FORMAT_COMMAND_ID: &str = "format-document";

/// Command id of the host's built-in save action.
///
/// Undocumented host internal; interception is best effort (see
/// `plugin::save_hook`).
pub const SAVE_COMMAND_ID: &str = "editor:save-file";

/// A live editor view over a markdown document.
pub trait Editor {
    /// Full document text.
    fn text(&self) -> String;

    /// Current cursor position.
    fn cursor(&self) -> Position;

    /// Replace the whole document in one write.
    fn set_text(&mut self, text: &str);

    /// Move the cursor, clamping to valid bounds.
    fn set_cursor(&mut self, pos: Position);
}

/// What a command callback may reach in the host while it runs.
pub trait HostContext {
    /// The focused markdown editor view, if any.
    fn active_editor(&mut self) -> Option<&mut dyn Editor>;

    /// Show a user-visible notification.
    fn notify(&mut self, message: &str);
}

/// A command callback. The host invokes these serially on its event loop.
pub type CommandCallback = Box<dyn FnMut(&mut dyn HostContext) -> Result<(), PluginError>>;

/// A registered host command.
pub struct Command {
    pub id: String,
    pub name: String,
    pub callback: CommandCallback,
}

/// The host's command table.
pub trait CommandRegistry {
    /// Register a command under its id, replacing any previous entry.
    fn register(&mut self, command: Command);

    /// Remove a command; returns whether it existed.
    fn unregister(&mut self, id: &str) -> bool;

    /// Swap the callback of an existing command, returning the one it had.
    /// Returns `None` without registering anything when the id is unknown.
    fn replace_callback(&mut self, id: &str, callback: CommandCallback)
    -> Option<CommandCallback>;
}

/// Host-provided key/value persistence for the plugin's settings record.
///
/// The record is an opaque string; serialization is the plugin's concern,
/// storage is the host's.
pub trait SettingsStore {
    /// Load the stored record, `None` on first run.
    fn load(&self) -> Result<Option<String>>;

    /// Overwrite the stored record.
    fn save(&self, raw: &str) -> Result<()>;
}

/// In-memory command table; what a standalone host or a test wires up.
#[derive(Default)]
pub struct MemoryCommandRegistry {
    commands: HashMap<String, Command>,
}

impl MemoryCommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    /// Run a command the way the host's event loop would.
    pub fn run(&mut self, id: &str, ctx: &mut dyn HostContext) -> Result<(), PluginError> {
        let Some(command) = self.commands.get_mut(id) else {
            return Err(PluginError::UnknownCommand(id.to_string()));
        };
        (command.callback)(ctx)
    }
}

impl CommandRegistry for MemoryCommandRegistry {
    fn register(&mut self, command: Command) {
        tracing::debug!("registering command `{}`", command.id);
        self.commands.insert(command.id.clone(), command);
    }

    fn unregister(&mut self, id: &str) -> bool {
        self.commands.remove(id).is_some()
    }

    fn replace_callback(
        &mut self,
        id: &str,
        callback: CommandCallback,
    ) -> Option<CommandCallback> {
        let command = self.commands.get_mut(id)?;
        Some(std::mem::replace(&mut command.callback, callback))
    }
}

/// Volatile settings store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemorySettingsStore {
    record: RefCell<Option<String>>,
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.record.borrow().clone())
    }

    fn save(&self, raw: &str) -> Result<()> {
        *self.record.borrow_mut() = Some(raw.to_string());
        Ok(())
    }
}

/// Settings store persisting to a file under the host's config directory.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    /// Store under the per-user config directory for `host_name`.
    pub fn new(host_name: &str) -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", host_name)
            .ok_or_else(|| anyhow!("cannot determine config directory"))?;
        Ok(Self {
            path: dirs.config_dir().join("notefmt.toml"),
        })
    }

    /// Store at an explicit path.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path)?))
    }

    fn save(&self, raw: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
