//! Plugin lifecycle: wiring the dispatcher, save hook and settings
//! surface into a host.

pub mod dispatch;
pub mod panel;
pub mod save_hook;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::engine::{FormatEngine, MarkdownEngine};
use crate::error::PluginError;
use crate::host::{
    Command, CommandRegistry, FORMAT_COMMAND_ID, HostContext, SAVE_COMMAND_ID, SettingsStore,
};
use crate::model::settings::PluginSettings;
use crate::plugin::save_hook::SaveHook;

/// The plugin instance a host keeps for the lifetime of the session.
pub struct FormatPlugin {
    settings: Rc<RefCell<PluginSettings>>,
    store: Rc<dyn SettingsStore>,
    save_hook: Option<SaveHook>,
}

impl FormatPlugin {
    /// Activate with the default markdown engine: load settings, register
    /// the format command, hook the save command.
    pub fn activate(
        registry: &mut dyn CommandRegistry,
        store: Rc<dyn SettingsStore>,
    ) -> Result<Self> {
        Self::activate_with_engine(registry, store, Rc::new(MarkdownEngine::new()))
    }

    /// Activate with a custom engine.
    pub fn activate_with_engine(
        registry: &mut dyn CommandRegistry,
        store: Rc<dyn SettingsStore>,
        engine: Rc<dyn FormatEngine>,
    ) -> Result<Self> {
        let settings = Rc::new(RefCell::new(PluginSettings::load(store.as_ref())?));

        registry.register(format_command(Rc::clone(&engine)));

        let save_hook = save_hook::install(registry, SAVE_COMMAND_ID, Rc::clone(&settings), engine);
        if save_hook.is_none() {
            tracing::info!("format on save degraded to the manual command only");
        }

        Ok(Self {
            settings,
            store,
            save_hook,
        })
    }

    /// Unregister the command and restore the save callback.
    pub fn deactivate(mut self, registry: &mut dyn CommandRegistry) {
        registry.unregister(FORMAT_COMMAND_ID);
        if let Some(hook) = self.save_hook.take() {
            hook.uninstall(registry);
        }
    }

    /// Whether the save hook found its integration point.
    pub fn save_hook_installed(&self) -> bool {
        self.save_hook.is_some()
    }

    /// Current value of the format-on-save setting.
    pub fn format_on_save(&self) -> bool {
        self.settings.borrow().format_on_save
    }

    /// The settings section for the host to render.
    pub fn settings_section(&self) -> panel::SettingsSection {
        panel::section(&self.settings.borrow())
    }

    /// Apply a toggle change from the settings UI and persist immediately.
    pub fn set_toggle(&self, id: &str, value: bool) -> Result<()> {
        if id != panel::FORMAT_ON_SAVE_TOGGLE {
            return Err(PluginError::UnknownToggle(id.to_string()).into());
        }
        self.settings.borrow_mut().format_on_save = value;
        self.settings.borrow().save(self.store.as_ref())
    }
}

fn format_command(engine: Rc<dyn FormatEngine>) -> Command {
    Command {
        id: FORMAT_COMMAND_ID.to_string(),
        name: "Format document".to_string(),
        callback: Box::new(move |ctx: &mut dyn HostContext| {
            let attempted = match ctx.active_editor() {
                Some(editor) => Some(dispatch::format_document(editor, engine.as_ref())),
                None => None,
            };
            match attempted {
                Some(Ok(())) => Ok(()),
                Some(Err(err)) => {
                    ctx.notify(&format!("Format document failed: {err}"));
                    Err(err.into())
                }
                None => {
                    ctx.notify("Format document: no active markdown editor");
                    Err(PluginError::NoActiveEditor)
                }
            }
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Editor, MemoryCommandRegistry, MemorySettingsStore};
    use crate::model::buffer::RopeBuffer;

    struct TestHost {
        buffer: Option<RopeBuffer>,
        notifications: Vec<String>,
    }

    impl TestHost {
        fn with_buffer(text: &str) -> Self {
            Self {
                buffer: Some(RopeBuffer::from_text(text)),
                notifications: Vec::new(),
            }
        }
    }

    impl HostContext for TestHost {
        fn active_editor(&mut self) -> Option<&mut dyn Editor> {
            self.buffer.as_mut().map(|b| b as &mut dyn Editor)
        }

        fn notify(&mut self, message: &str) {
            self.notifications.push(message.to_string());
        }
    }

    fn save_command(log: Rc<RefCell<Vec<&'static str>>>) -> Command {
        Command {
            id: SAVE_COMMAND_ID.to_string(),
            name: "Save file".to_string(),
            callback: Box::new(move |_ctx| {
                log.borrow_mut().push("save");
                Ok(())
            }),
        }
    }

    #[test]
    fn format_command_formats_the_active_editor() {
        let mut registry = MemoryCommandRegistry::new();
        let plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();
        assert!(!plugin.save_hook_installed());

        let mut host = TestHost::with_buffer("*  item\n");
        registry.run(FORMAT_COMMAND_ID, &mut host).unwrap();
        assert_eq!(host.buffer.as_ref().unwrap().text(), "- item\n");
    }

    #[test]
    fn format_command_without_editor_notifies_and_errors() {
        let mut registry = MemoryCommandRegistry::new();
        let _plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();

        let mut host = TestHost {
            buffer: None,
            notifications: Vec::new(),
        };
        let err = registry.run(FORMAT_COMMAND_ID, &mut host).unwrap_err();
        assert!(matches!(err, PluginError::NoActiveEditor));
        assert_eq!(host.notifications.len(), 1);
    }

    #[test]
    fn format_failure_surfaces_a_notification() {
        let mut registry = MemoryCommandRegistry::new();
        let _plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();

        let mut host = TestHost::with_buffer("```json\n{nope\n```\n");
        let err = registry.run(FORMAT_COMMAND_ID, &mut host).unwrap_err();
        assert!(matches!(err, PluginError::Format(_)));
        assert!(host.notifications[0].contains("Format document failed"));
        assert_eq!(host.buffer.as_ref().unwrap().text(), "```json\n{nope\n```\n");
    }

    #[test]
    fn saving_formats_first_when_enabled() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = MemoryCommandRegistry::new();
        registry.register(save_command(log.clone()));

        let plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();
        assert!(plugin.save_hook_installed());

        let mut host = TestHost::with_buffer("*  x\n");
        registry.run(SAVE_COMMAND_ID, &mut host).unwrap();
        assert_eq!(host.buffer.as_ref().unwrap().text(), "- x\n");
        assert_eq!(*log.borrow(), vec!["save"]);
    }

    #[test]
    fn saving_skips_formatting_when_disabled() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = MemoryCommandRegistry::new();
        registry.register(save_command(log.clone()));

        let plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();
        plugin.set_toggle(panel::FORMAT_ON_SAVE_TOGGLE, false).unwrap();

        let mut host = TestHost::with_buffer("*  x\n");
        registry.run(SAVE_COMMAND_ID, &mut host).unwrap();
        assert_eq!(host.buffer.as_ref().unwrap().text(), "*  x\n");
        assert_eq!(*log.borrow(), vec!["save"]);
    }

    #[test]
    fn toggling_persists_immediately() {
        let store = Rc::new(MemorySettingsStore::default());
        let mut registry = MemoryCommandRegistry::new();
        let plugin = FormatPlugin::activate(&mut registry, store.clone()).unwrap();

        plugin.set_toggle(panel::FORMAT_ON_SAVE_TOGGLE, false).unwrap();
        let raw = store.load().unwrap().unwrap();
        assert!(raw.contains("format_on_save = false"));
    }

    #[test]
    fn settings_survive_reactivation() {
        let store = Rc::new(MemorySettingsStore::default());

        let mut registry = MemoryCommandRegistry::new();
        let plugin = FormatPlugin::activate(&mut registry, store.clone()).unwrap();
        assert!(plugin.format_on_save());
        plugin.set_toggle(panel::FORMAT_ON_SAVE_TOGGLE, false).unwrap();
        plugin.deactivate(&mut registry);

        let mut registry = MemoryCommandRegistry::new();
        let plugin = FormatPlugin::activate(&mut registry, store).unwrap();
        assert!(!plugin.format_on_save());
    }

    #[test]
    fn unknown_toggle_is_rejected() {
        let mut registry = MemoryCommandRegistry::new();
        let plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();
        assert!(plugin.set_toggle("no-such-toggle", true).is_err());
    }

    #[test]
    fn settings_section_reflects_the_current_value() {
        let mut registry = MemoryCommandRegistry::new();
        let plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();

        let section = plugin.settings_section();
        assert!(section.toggle(panel::FORMAT_ON_SAVE_TOGGLE).unwrap().value);

        plugin.set_toggle(panel::FORMAT_ON_SAVE_TOGGLE, false).unwrap();
        let section = plugin.settings_section();
        assert!(!section.toggle(panel::FORMAT_ON_SAVE_TOGGLE).unwrap().value);
    }

    #[test]
    fn deactivation_unregisters_and_restores_save() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = MemoryCommandRegistry::new();
        registry.register(save_command(log.clone()));

        let plugin =
            FormatPlugin::activate(&mut registry, Rc::new(MemorySettingsStore::default())).unwrap();
        plugin.deactivate(&mut registry);

        assert!(!registry.contains(FORMAT_COMMAND_ID));

        // saving no longer formats, the original callback alone remains
        let mut host = TestHost::with_buffer("*  x\n");
        registry.run(SAVE_COMMAND_ID, &mut host).unwrap();
        assert_eq!(host.buffer.as_ref().unwrap().text(), "*  x\n");
        assert_eq!(*log.borrow(), vec!["save"]);
    }
}
