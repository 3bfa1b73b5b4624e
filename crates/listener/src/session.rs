//! Top-level `ngrok` session configuration and provisioning

use crate::caddyfile::{self, Directive};
use crate::error::{Arity, ResourceError, Result, SyntaxError, SyntaxErrorKind};
use crate::options::{ListenPlan, SessionOption};
use crate::registry::TunnelRegistry;
use crate::replace::{Replace, Replacer};
use crate::tunnel::TunnelConfig;
use ngrok_listener_core::duration::serde_duration;
use ngrok_listener_core::{ValidateConfig, ValidationError, parse_duration};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the block that holds the session configuration
pub const BLOCK_NAME: &str = "ngrok";

/// Surface syntax of a configuration file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Pick by file extension, then by the first character of the content
    #[default]
    Auto,
    /// Block directives
    Block,
    /// JSON document
    Json,
}

impl InputFormat {
    /// Resolve `Auto` to a concrete format
    pub fn detect(self, path: Option<&Path>, content: &str) -> Self {
        match self {
            Self::Auto => {
                let json_extension = path
                    .and_then(Path::extension)
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
                if json_extension || content.trim_start().starts_with('{') {
                    Self::Json
                } else {
                    Self::Block
                }
            }
            concrete => concrete,
        }
    }
}

/// Session settings plus the tunnel to open
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Account credential; when empty the client falls back to its environment
    #[serde(skip_serializing_if = "String::is_empty")]
    pub authtoken: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    /// Ingress region, e.g. `us` or `eu`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,

    /// Ingress server address override
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server: String,

    #[serde(
        rename = "heartbeatInterval",
        with = "serde_duration",
        skip_serializing_if = "serde_duration::is_zero"
    )]
    pub heartbeat_interval: Duration,

    #[serde(
        rename = "heartbeatTolerance",
        with = "serde_duration",
        skip_serializing_if = "serde_duration::is_zero"
    )]
    pub heartbeat_tolerance: Duration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tunnel: Option<TunnelConfig>,
}

/// JSON shape of [`SessionConfig`] before the tunnel type is resolved
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionDocument {
    #[serde(alias = "auth_token")]
    authtoken: String,
    metadata: String,
    region: String,
    server: String,
    #[serde(
        rename = "heartbeatInterval",
        alias = "heartbeat_interval",
        with = "serde_duration"
    )]
    heartbeat_interval: Duration,
    #[serde(
        rename = "heartbeatTolerance",
        alias = "heartbeat_tolerance",
        with = "serde_duration"
    )]
    heartbeat_tolerance: Duration,
    tunnel: Option<serde_json::Value>,
}

impl SessionConfig {
    /// Parse an `ngrok { ... }` block
    pub fn from_caddyfile(input: &str, registry: &TunnelRegistry) -> Result<Self> {
        let mut config = Self::default();
        for directive in caddyfile::parse(input)? {
            if directive.name != BLOCK_NAME {
                return Err(directive.unrecognized().into());
            }
            directive.no_args()?;
            config
                .parse_block(directive.block_entries(), registry)
                .map_err(|e| e.within(BLOCK_NAME))?;
        }
        Ok(config)
    }

    /// Parse the JSON form of the session
    pub fn from_json(input: &str, registry: &TunnelRegistry) -> Result<Self> {
        let document: SessionDocument = serde_json::from_str(input)?;
        let tunnel = match document.tunnel {
            Some(serde_json::Value::Null) | None => None,
            Some(value) => Some(registry.decode_json(value)?),
        };

        Ok(Self {
            authtoken: document.authtoken,
            metadata: document.metadata,
            region: document.region,
            server: document.server,
            heartbeat_interval: document.heartbeat_interval,
            heartbeat_tolerance: document.heartbeat_tolerance,
            tunnel,
        })
    }

    /// Parse configuration text in the given format
    pub fn from_source(
        input: &str,
        format: InputFormat,
        path: Option<&Path>,
        registry: &TunnelRegistry,
    ) -> Result<Self> {
        match format.detect(path, input) {
            InputFormat::Json => Self::from_json(input, registry),
            _ => Self::from_caddyfile(input, registry),
        }
    }

    /// Read and parse a configuration file
    pub fn load(path: &Path, format: InputFormat, registry: &TunnelRegistry) -> Result<Self> {
        let input = std::fs::read_to_string(path).map_err(|source| ResourceError::Read {
            field: "config".to_string(),
            path: PathBuf::from(path),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::from_source(&input, format, Some(path), registry)
    }

    /// Encode as the JSON document accepted by [`SessionConfig::from_json`]
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let encoded = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(encoded)
    }

    fn parse_block(
        &mut self,
        block: &[Directive],
        registry: &TunnelRegistry,
    ) -> std::result::Result<(), SyntaxError> {
        for directive in block {
            match directive.name.as_str() {
                "authtoken" | "auth_token" => {
                    self.authtoken = directive.optional_arg()?.unwrap_or_default().to_string();
                }
                "metadata" => self.metadata = directive.one_arg()?.to_string(),
                "region" => self.region = directive.one_arg()?.to_string(),
                "server" => self.server = directive.one_arg()?.to_string(),
                "heartbeat_interval" => self.heartbeat_interval = duration_arg(directive)?,
                "heartbeat_tolerance" => self.heartbeat_tolerance = duration_arg(directive)?,
                "tunnel" => {
                    let name = directive.args.first().map(String::as_str);
                    if directive.args.len() > 1 {
                        return Err(directive.arg_count(Arity::AtMostOne));
                    }
                    let tunnel = registry
                        .parse_block(name, directive.block_entries())
                        .map_err(|e| e.at_line(directive.line))?;
                    if let Some(previous) = self.tunnel.replace(tunnel) {
                        warn!(
                            previous = %previous.kind(),
                            line = directive.line,
                            "tunnel configured more than once, using the last one"
                        );
                    }
                }
                _ => return Err(directive.unrecognized()),
            }
        }
        Ok(())
    }

    /// Session options in the order the client applies them
    pub fn session_options(&self) -> Vec<SessionOption> {
        let mut options = Vec::new();

        if self.authtoken.is_empty() {
            warn!("no authtoken configured, the client will read NGROK_AUTHTOKEN");
            options.push(SessionOption::AuthtokenFromEnv);
        } else {
            options.push(SessionOption::Authtoken(self.authtoken.clone()));
        }
        if !self.metadata.is_empty() {
            options.push(SessionOption::Metadata(self.metadata.clone()));
        }
        if !self.region.is_empty() {
            options.push(SessionOption::Region(self.region.clone()));
        }
        if !self.server.is_empty() {
            options.push(SessionOption::Server(self.server.clone()));
        }
        if !self.heartbeat_interval.is_zero() {
            options.push(SessionOption::HeartbeatInterval(self.heartbeat_interval));
        }
        if !self.heartbeat_tolerance.is_zero() {
            options.push(SessionOption::HeartbeatTolerance(self.heartbeat_tolerance));
        }
        options
    }

    /// Substitute placeholders, validate, and assemble every option
    ///
    /// A configuration without a tunnel gets an empty TCP tunnel.
    pub fn provision(mut self, replacer: &dyn Replacer) -> Result<ListenPlan> {
        if self.tunnel.is_none() {
            debug!("no tunnel configured, defaulting to tcp");
            self.tunnel = Some(TunnelConfig::default());
        }

        self.replace_with(replacer);
        self.validate()?;

        let Some(tunnel) = &self.tunnel else {
            return Err(ValidationError::required("tunnel").into());
        };
        let plan = ListenPlan {
            session: self.session_options(),
            tunnel: tunnel.assemble()?,
        };

        info!(
            tunnel = %plan.tunnel.kind,
            session_options = plan.session.len(),
            endpoint_options = plan.tunnel.options.len(),
            "provisioned ngrok listener"
        );
        Ok(plan)
    }
}

fn duration_arg(directive: &Directive) -> std::result::Result<Duration, SyntaxError> {
    let raw = directive.one_arg()?;
    parse_duration(raw).map_err(|reason| {
        directive.error(SyntaxErrorKind::DurationParse {
            directive: directive.name.clone(),
            reason,
        })
    })
}

impl Replace for SessionConfig {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.authtoken.replace_with(replacer);
        self.metadata.replace_with(replacer);
        self.region.replace_with(replacer);
        self.server.replace_with(replacer);
        if let Some(tunnel) = &mut self.tunnel {
            tunnel.replace_with(replacer);
        }
    }
}

impl ValidateConfig for SessionConfig {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        match &self.tunnel {
            Some(tunnel) => tunnel.validate(),
            None => Err(ValidationError::required("tunnel")),
        }
    }
}

/// Substitute, validate and assemble a parsed configuration
pub fn provision(config: SessionConfig, replacer: &dyn Replacer) -> Result<ListenPlan> {
    config.provision(replacer)
}
