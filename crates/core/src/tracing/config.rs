//! Configuration for tracing and instrumentation

use serde::{Deserialize, Serialize};

/// Main instrumentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Service name attached to log output
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log level filter (e.g., "info", "debug", "ngrok_listener=trace")
    pub log_level: String,
    /// Emit newline-delimited JSON instead of human-readable lines
    #[serde(default)]
    pub json: bool,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            service_name: "ngrok-listener".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl InstrumentationConfig {
    /// Create configuration from environment variables
    ///
    /// Supports the following environment variables:
    /// - `SERVICE_NAME`: Service name
    /// - `RUST_LOG`: Log level filter
    /// - `LOG_FORMAT`: `json` for structured output, anything else for text
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let service_name = std::env::var("SERVICE_NAME").unwrap_or(defaults.service_name);
        let log_level = std::env::var("RUST_LOG").unwrap_or(defaults.log_level);
        let json = std::env::var("LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self {
            service_name,
            service_version: defaults.service_version,
            log_level,
            json,
        }
    }

    /// Same configuration with a different log level
    #[must_use]
    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }
}
