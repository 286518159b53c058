use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::host::SettingsStore;

/// Persisted plugin settings, stored as a TOML record through the host's
/// settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    /// Format the document before the host's save command runs.
    pub format_on_save: bool,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            format_on_save: true,
        }
    }
}

impl PluginSettings {
    /// Load settings with layering: defaults → stored record.
    pub fn load(store: &dyn SettingsStore) -> Result<Self> {
        match store.load()? {
            Some(raw) => Ok(toml::from_str(&raw)?),
            None => Ok(Self::default()),
        }
    }

    /// Persist the current settings.
    pub fn save(&self, store: &dyn SettingsStore) -> Result<()> {
        store.save(&toml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemorySettingsStore;

    #[test]
    fn defaults_to_format_on_save() {
        assert!(PluginSettings::default().format_on_save);
    }

    #[test]
    fn first_load_uses_defaults() {
        let store = MemorySettingsStore::default();
        let settings = PluginSettings::load(&store).unwrap();
        assert_eq!(settings, PluginSettings::default());
    }

    #[test]
    fn partial_record_merges_over_defaults() {
        let store = MemorySettingsStore::default();
        store.save("").unwrap();
        let settings = PluginSettings::load(&store).unwrap();
        assert!(settings.format_on_save);
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = MemorySettingsStore::default();
        let settings = PluginSettings {
            format_on_save: false,
        };
        settings.save(&store).unwrap();
        assert_eq!(PluginSettings::load(&store).unwrap(), settings);
    }
}
