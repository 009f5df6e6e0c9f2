//! Configuration for the tool graph engine
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (toolgraph.toml)
//! - Environment variables (TOOLGRAPH_*)
//!
//! ## Example config file (toolgraph.toml):
//! ```toml
//! [registration]
//! strict_naming = true
//! default_category = "Tools"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Main configuration for the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tool registration settings
    #[serde(default)]
    pub registration: RegistrationConfig,
}

/// Tool registration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Abort startup when a registered tool declares a non-generic property
    /// schema with no derivable type name. When disabled the property is
    /// logged and its socket falls back to `unknown`.
    #[serde(default = "default_true")]
    pub strict_naming: bool,

    /// Editor category for tools whose annotations carry none.
    #[serde(default = "default_category")]
    pub default_category: String,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            strict_naming: true,
            default_category: default_category(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_category() -> String {
    "Tools".to_string()
}

impl EngineConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = ["toolgraph.toml", ".toolgraph.toml", "config/toolgraph.toml"];
        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("TOOLGRAPH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = EngineConfig::default();
        assert!(config.registration.strict_naming);
        assert_eq!(config.registration.default_category, "Tools");
    }

    #[test]
    fn deserializes_partial_config() {
        let config: EngineConfig =
            serde_json::from_value(serde_json::json!({ "registration": { "strict_naming": false } }))
                .unwrap();
        assert!(!config.registration.strict_naming);
        assert_eq!(config.registration.default_category, "Tools");
    }
}
