//! Built-in fence plugins.

use super::FencePlugin;
use crate::error::FormatError;

/// Pretty-prints `json` fences.
pub struct JsonFence;

impl FencePlugin for JsonFence {
    fn language(&self) -> &'static str {
        "json"
    }

    fn format(&self, source: &str) -> Result<String, FormatError> {
        let value: serde_json::Value = serde_json::from_str(source).map_err(|err| fence_error("json", err))?;
        serde_json::to_string_pretty(&value).map_err(|err| fence_error("json", err))
    }
}

/// Normalizes `toml` fences through a parse/serialize round trip.
pub struct TomlFence;

impl FencePlugin for TomlFence {
    fn language(&self) -> &'static str {
        "toml"
    }

    fn format(&self, source: &str) -> Result<String, FormatError> {
        let value: toml::Value = toml::from_str(source).map_err(|err| fence_error("toml", err))?;
        toml::to_string_pretty(&value).map_err(|err| fence_error("toml", err))
    }
}

/// The full plugin set the dispatcher hands to the engine.
pub fn default_fence_plugins() -> Vec<Box<dyn FencePlugin>> {
    vec![Box::new(JsonFence), Box::new(TomlFence)]
}

fn fence_error(language: &str, err: impl std::fmt::Display) -> FormatError {
    FormatError::Fence {
        language: language.to_string(),
        message: err.to_string(),
    }
}
