//! Settings for the `ngrok-listener` tool itself

use crate::session::InputFormat;
use config::{Config, ConfigError, Environment, File};
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix of environment variables overriding settings, e.g. `NGROK_LISTENER__LOG_LEVEL`
pub const ENV_PREFIX: &str = "NGROK_LISTENER";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Tool settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSettings {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Configuration syntax when the command line does not name one
    #[serde(default)]
    pub format: InputFormat,

    /// Resolve `{env.*}` placeholders from the process environment
    #[serde(default = "default_true")]
    pub substitute_env: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            format: InputFormat::default(),
            substitute_env: default_true(),
        }
    }
}

impl ListenerSettings {
    /// Load settings from defaults, well-known files, an optional explicit
    /// file and the environment, later sources overriding earlier ones
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        let config_paths = ["/etc/ngrok-listener/settings.toml", "ngrok-listener.toml"];
        for candidate in config_paths {
            if Path::new(candidate).exists() {
                builder = builder.add_source(File::with_name(candidate).required(false));
            }
        }

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

impl ValidateConfig for ListenerSettings {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_one_of(&self.log_level, &LOG_LEVELS, "log_level")
    }
}
