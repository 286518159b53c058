//! Declarative settings surface: one section, one toggle.
//!
//! The plugin only describes its controls; rendering belongs to the host.

use crate::model::settings::PluginSettings;

/// Toggle id for the format-on-save setting.
pub const FORMAT_ON_SAVE_TOGGLE: &str = "format-on-save";

/// A labeled boolean control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleSpec {
    pub id: &'static str,
    pub name: String,
    pub description: String,
    pub value: bool,
}

/// A settings section the host renders: heading plus controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsSection {
    pub heading: String,
    pub toggles: Vec<ToggleSpec>,
}

impl SettingsSection {
    pub fn toggle(&self, id: &str) -> Option<&ToggleSpec> {
        self.toggles.iter().find(|t| t.id == id)
    }
}

/// Build the plugin's settings section from the current settings.
pub fn section(settings: &PluginSettings) -> SettingsSection {
    SettingsSection {
        heading: "Formatting".to_string(),
        toggles: vec![ToggleSpec {
            id: FORMAT_ON_SAVE_TOGGLE,
            name: "Format on save".to_string(),
            description: "Format the document before it is written to disk.".to_string(),
            value: settings.format_on_save,
        }],
    }
}
