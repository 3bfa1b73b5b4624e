//! Tunnel flavors
//!
//! Each flavor is a plain record that can be read from a block of
//! directives or from JSON, substituted, validated, and finally assembled
//! into endpoint options.

mod certs;
pub mod http;
mod labeled;
mod tcp;
mod tls;

pub use http::HttpTunnel;
pub use labeled::LabeledTunnel;
pub use tcp::TcpTunnel;
pub use tls::TlsTunnel;

use crate::caddyfile::{self, Directive};
use crate::error::{ResourceError, SyntaxError};
use crate::options::{EndpointOption, TunnelSpec};
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Name of a tunnel flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TunnelKind {
    Tcp,
    Tls,
    Http,
    Labeled,
}

impl TunnelKind {
    pub const ALL: [Self; 4] = [Self::Tcp, Self::Tls, Self::Http, Self::Labeled];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Tls => "tls",
            Self::Http => "http",
            Self::Labeled => "labeled",
        }
    }
}

impl fmt::Display for TunnelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour shared by every tunnel flavor
pub trait TunnelOptions: Replace + ValidateConfig + Default + Into<TunnelConfig> {
    const KIND: TunnelKind;

    /// Apply one directive of the tunnel's block
    fn parse_directive(&mut self, directive: &Directive) -> Result<(), SyntaxError>;

    /// Produce the endpoint options, reading any referenced files
    fn assemble(&self) -> Result<Vec<EndpointOption>, ResourceError>;

    fn parse_block(&mut self, block: &[Directive]) -> Result<(), SyntaxError> {
        for directive in block {
            self.parse_directive(directive)?;
        }
        Ok(())
    }

    /// Parse a standalone `<kind> { ... }` snippet
    fn from_caddyfile(input: &str) -> Result<Self, SyntaxError> {
        let mut tunnel = Self::default();
        for directive in caddyfile::parse(input)? {
            if directive.name != Self::KIND.as_str() {
                return Err(directive.unrecognized());
            }
            directive.no_args()?;
            tunnel
                .parse_block(directive.block_entries())
                .map_err(|e| e.within(Self::KIND.as_str()))?;
        }
        Ok(tunnel)
    }
}

/// One configured tunnel of any flavor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TunnelConfig {
    Tcp(TcpTunnel),
    Tls(TlsTunnel),
    Http(HttpTunnel),
    Labeled(LabeledTunnel),
}

impl Default for TunnelConfig {
    fn default() -> Self {
        Self::Tcp(TcpTunnel::default())
    }
}

impl From<TcpTunnel> for TunnelConfig {
    fn from(tunnel: TcpTunnel) -> Self {
        Self::Tcp(tunnel)
    }
}

impl From<TlsTunnel> for TunnelConfig {
    fn from(tunnel: TlsTunnel) -> Self {
        Self::Tls(tunnel)
    }
}

impl From<HttpTunnel> for TunnelConfig {
    fn from(tunnel: HttpTunnel) -> Self {
        Self::Http(tunnel)
    }
}

impl From<LabeledTunnel> for TunnelConfig {
    fn from(tunnel: LabeledTunnel) -> Self {
        Self::Labeled(tunnel)
    }
}

impl TunnelConfig {
    pub const fn kind(&self) -> TunnelKind {
        match self {
            Self::Tcp(_) => TunnelKind::Tcp,
            Self::Tls(_) => TunnelKind::Tls,
            Self::Http(_) => TunnelKind::Http,
            Self::Labeled(_) => TunnelKind::Labeled,
        }
    }

    /// Assemble the tunnel into its kind and ordered endpoint options
    pub fn assemble(&self) -> Result<TunnelSpec, ResourceError> {
        let options = match self {
            Self::Tcp(tunnel) => tunnel.assemble(),
            Self::Tls(tunnel) => tunnel.assemble(),
            Self::Http(tunnel) => tunnel.assemble(),
            Self::Labeled(tunnel) => tunnel.assemble(),
        }?;

        for option in &options {
            debug!(tunnel = %self.kind(), option = option.name(), "applying endpoint option");
        }

        Ok(TunnelSpec {
            kind: self.kind(),
            options,
        })
    }
}

impl Replace for TunnelConfig {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        match self {
            Self::Tcp(tunnel) => tunnel.replace_with(replacer),
            Self::Tls(tunnel) => tunnel.replace_with(replacer),
            Self::Http(tunnel) => tunnel.replace_with(replacer),
            Self::Labeled(tunnel) => tunnel.replace_with(replacer),
        }
    }
}

impl ValidateConfig for TunnelConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Tcp(tunnel) => tunnel.validate(),
            Self::Tls(tunnel) => tunnel.validate(),
            Self::Http(tunnel) => tunnel.validate(),
            Self::Labeled(tunnel) => tunnel.validate(),
        }
        .map_err(|e| e.within(format!("tunnel {}", self.kind())))
    }
}

/// Append the arguments of a repeated `allow`/`deny` style directive
pub(crate) fn extend_list(list: &mut Vec<String>, directive: &Directive) -> Result<(), SyntaxError> {
    list.extend(directive.variadic()?.iter().cloned());
    Ok(())
}

pub(crate) fn push_text(
    options: &mut Vec<EndpointOption>,
    value: &str,
    option: fn(String) -> EndpointOption,
) {
    if !value.trim().is_empty() {
        options.push(option(value.to_string()));
    }
}

pub(crate) fn push_cidrs(options: &mut Vec<EndpointOption>, allow: &[String], deny: &[String]) {
    if !allow.is_empty() {
        options.push(EndpointOption::AllowCidr(allow.to_vec()));
    }
    if !deny.is_empty() {
        options.push(EndpointOption::DenyCidr(deny.to_vec()));
    }
}

/// Ordered name/value pairs with one value per name, stored in JSON as an object
pub(crate) mod ordered_map {
    use crate::replace::{Replace, Replacer};
    use serde::de::{MapAccess, Visitor};
    use serde::ser::SerializeMap;
    use serde::{Deserializer, Serializer};
    use std::fmt;

    /// Set `name`, replacing an earlier value in place
    pub fn insert(pairs: &mut Vec<(String, String)>, name: String, value: String) {
        match pairs.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, current)) => *current = value,
            None => pairs.push((name, value)),
        }
    }

    /// Substitute names and values, then merge names that became equal
    pub fn replace_with(pairs: &mut Vec<(String, String)>, replacer: &dyn Replacer) {
        let mut substituted = std::mem::take(pairs);
        substituted.replace_with(replacer);
        for (name, value) in substituted {
            insert(pairs, name, value);
        }
    }

    pub fn serialize<S>(pairs: &[(String, String)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(pairs.len()))?;
        for (name, value) in pairs {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PairsVisitor)
    }

    struct PairsVisitor;

    impl<'de> Visitor<'de> for PairsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an object of string values")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut pairs: Vec<(String, String)> =
                Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, value)) = access.next_entry::<String, String>()? {
                insert(&mut pairs, name, value);
            }
            Ok(pairs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tunnel_is_tcp() {
        assert_eq!(TunnelConfig::default().kind(), TunnelKind::Tcp);
        assert_eq!(
            TunnelConfig::default().assemble().unwrap().options,
            Vec::new()
        );
    }

    #[test]
    fn test_serialize_is_tagged_by_type() {
        let tunnel = TunnelConfig::Tcp(TcpTunnel {
            remote_addr: "1.tcp.ngrok.io:12345".to_string(),
            ..TcpTunnel::default()
        });
        assert_eq!(
            serde_json::to_value(&tunnel).unwrap(),
            serde_json::json!({"type": "tcp", "remote_addr": "1.tcp.ngrok.io:12345"})
        );
    }

    #[test]
    fn test_blank_text_is_not_assembled() {
        let mut options = Vec::new();
        push_text(&mut options, "  ", EndpointOption::Domain);
        push_text(&mut options, "", EndpointOption::Metadata);
        push_text(&mut options, "foo.ngrok.app", EndpointOption::Domain);
        assert_eq!(
            options,
            vec![EndpointOption::Domain("foo.ngrok.app".to_string())]
        );
    }

    #[test]
    fn test_validation_error_names_tunnel() {
        let err = TunnelConfig::Labeled(LabeledTunnel::default())
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "tunnel labeled: a label is required");
    }

    #[test]
    fn test_snippet_rejects_other_kind() {
        let err = TcpTunnel::from_caddyfile("tls {\n}").unwrap_err();
        assert!(matches!(
            err.kind,
            crate::error::SyntaxErrorKind::UnrecognizedDirective(_)
        ));
    }
}
