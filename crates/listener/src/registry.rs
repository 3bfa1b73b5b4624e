//! Tunnel type registry
//!
//! Maps tunnel type names to the functions that read that type from a block
//! of directives or from JSON. The registry is built once at startup and
//! passed by reference to whatever loads configuration.

use crate::caddyfile::Directive;
use crate::error::{SyntaxError, SyntaxErrorKind};
use crate::tunnel::{
    HttpTunnel, LabeledTunnel, TcpTunnel, TlsTunnel, TunnelConfig, TunnelKind, TunnelOptions,
};
use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Reads a tunnel from the directives of its block
pub type BlockParser = fn(&[Directive]) -> Result<TunnelConfig, SyntaxError>;

/// Reads a tunnel from a JSON object with the type tag already removed
pub type JsonDecoder = fn(Value) -> Result<TunnelConfig, serde_json::Error>;

/// The readers registered for one tunnel type
#[derive(Debug, Clone, Copy)]
pub struct TunnelParser {
    pub kind: TunnelKind,
    pub parse_block: BlockParser,
    pub decode_json: JsonDecoder,
}

fn parse_block_as<T: TunnelOptions>(block: &[Directive]) -> Result<TunnelConfig, SyntaxError> {
    let mut tunnel = T::default();
    tunnel.parse_block(block)?;
    Ok(tunnel.into())
}

fn decode_json_as<T>(value: Value) -> Result<TunnelConfig, serde_json::Error>
where
    T: TunnelOptions + DeserializeOwned,
{
    serde_json::from_value::<T>(value).map(Into::into)
}

impl TunnelParser {
    /// Readers for a built-in tunnel type
    pub fn of<T>() -> Self
    where
        T: TunnelOptions + DeserializeOwned,
    {
        Self {
            kind: T::KIND,
            parse_block: parse_block_as::<T>,
            decode_json: decode_json_as::<T>,
        }
    }
}

/// Name to parser lookup for tunnel types
#[derive(Debug, Clone)]
pub struct TunnelRegistry {
    parsers: BTreeMap<String, TunnelParser>,
}

impl TunnelRegistry {
    /// Type used when a configuration names none
    pub const DEFAULT_TYPE: &'static str = "tcp";

    /// JSON keys that may carry the tunnel type
    pub const TYPE_KEYS: [&'static str; 2] = ["type", "tunnel"];

    /// A registry holding the built-in `tcp`, `tls`, `http` and `labeled` types
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(TunnelKind::Tcp.as_str(), TunnelParser::of::<TcpTunnel>());
        registry.register(TunnelKind::Tls.as_str(), TunnelParser::of::<TlsTunnel>());
        registry.register(TunnelKind::Http.as_str(), TunnelParser::of::<HttpTunnel>());
        registry.register(
            TunnelKind::Labeled.as_str(),
            TunnelParser::of::<LabeledTunnel>(),
        );
        registry
    }

    /// A registry with no types at all
    pub const fn empty() -> Self {
        Self {
            parsers: BTreeMap::new(),
        }
    }

    /// Register a parser under `name`, returning the one it replaced
    pub fn register(&mut self, name: impl Into<String>, parser: TunnelParser) -> Option<TunnelParser> {
        let name = name.into();
        debug!(tunnel = %name, kind = %parser.kind, "registering tunnel type");
        self.parsers.insert(name, parser)
    }

    /// Look up a tunnel type by name
    pub fn resolve(&self, name: &str) -> Result<&TunnelParser, SyntaxError> {
        self.parsers.get(name).ok_or_else(|| {
            SyntaxError::detached(SyntaxErrorKind::UnknownTunnelType {
                name: name.to_string(),
                known: self.names().map(ToString::to_string).collect(),
            })
        })
    }

    /// Registered type names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    /// Read a `tunnel [type] { ... }` block
    pub fn parse_block(&self, name: Option<&str>, block: &[Directive]) -> Result<TunnelConfig, SyntaxError> {
        let name = name.unwrap_or(Self::DEFAULT_TYPE);
        let parser = self.resolve(name)?;
        (parser.parse_block)(block).map_err(|e| e.within(format!("tunnel {name}")))
    }

    /// Read a tunnel object tagged with its type
    pub fn decode_json(&self, value: Value) -> Result<TunnelConfig, crate::ListenerError> {
        let Value::Object(mut object) = value else {
            return Err(serde_json::Error::custom("tunnel must be a JSON object").into());
        };

        let tag = Self::TYPE_KEYS.iter().find_map(|key| object.remove(*key));
        let name = match tag {
            None => Self::DEFAULT_TYPE.to_string(),
            Some(Value::String(name)) => name,
            Some(other) => {
                return Err(SyntaxError::detached(SyntaxErrorKind::InvalidValue {
                    directive: "type".to_string(),
                    value: other.to_string(),
                    reason: "expected a tunnel type name".to_string(),
                })
                .into());
            }
        };

        let parser = self.resolve(&name)?;
        Ok((parser.decode_json)(Value::Object(object))?)
    }
}

impl Default for TunnelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
