//! Conditional formatting in front of the host's save command.
//!
//! The registered save callback is swapped for a wrapper that formats the
//! active markdown view first (when enabled) and then always runs the
//! displaced callback. The save command id is an undocumented host
//! internal; when it is absent the hook is skipped and the explicit
//! format command stays the only entry point.
//!
//! Fail open: a formatting failure during save is logged and shown as a
//! notification, and the save itself still runs on the unformatted text.

use std::cell::RefCell;
use std::rc::Rc;

use crate::engine::FormatEngine;
use crate::host::{CommandCallback, CommandRegistry, HostContext};
use crate::model::settings::PluginSettings;
use crate::plugin::dispatch;

/// Handle to an installed save hook.
pub struct SaveHook {
    command_id: String,
    original: Rc<RefCell<Option<CommandCallback>>>,
}

/// Wrap the save command's callback. Returns `None` (and installs
/// nothing) when the command is not registered.
pub(crate) fn install(
    registry: &mut dyn CommandRegistry,
    command_id: &str,
    settings: Rc<RefCell<PluginSettings>>,
    engine: Rc<dyn FormatEngine>,
) -> Option<SaveHook> {
    let original: Rc<RefCell<Option<CommandCallback>>> = Rc::new(RefCell::new(None));

    let original_slot = Rc::clone(&original);
    let wrapper: CommandCallback = Box::new(move |ctx: &mut dyn HostContext| {
        if settings.borrow().format_on_save {
            let attempted = match ctx.active_editor() {
                Some(editor) => Some(dispatch::format_document(editor, engine.as_ref())),
                None => None,
            };
            if let Some(Err(err)) = attempted {
                tracing::warn!("format on save failed: {err}");
                ctx.notify(&format!("Format on save failed: {err}; saving unformatted"));
            }
        }

        let mut slot = original_slot.borrow_mut();
        match slot.as_mut() {
            Some(save) => save(ctx),
            None => Ok(()),
        }
    });

    match registry.replace_callback(command_id, wrapper) {
        Some(previous) => {
            *original.borrow_mut() = Some(previous);
            tracing::debug!("save hook installed on `{command_id}`");
            Some(SaveHook {
                command_id: command_id.to_string(),
                original,
            })
        }
        None => {
            tracing::debug!("no `{command_id}` command; format on save unavailable");
            None
        }
    }
}

impl SaveHook {
    /// Put the displaced callback back. Best effort: if the command has
    /// vanished in the meantime there is nothing to restore into.
    pub(crate) fn uninstall(self, registry: &mut dyn CommandRegistry) {
        if let Some(original) = self.original.borrow_mut().take() {
            registry.replace_callback(&self.command_id, original);
        }
    }
}
