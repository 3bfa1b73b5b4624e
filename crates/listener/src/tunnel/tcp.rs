//! TCP tunnel

use super::{TunnelKind, TunnelOptions, extend_list, push_cidrs, push_text};
use crate::caddyfile::Directive;
use crate::error::{ResourceError, SyntaxError};
use crate::options::EndpointOption;
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError};
use serde::{Deserialize, Serialize};

/// A raw TCP endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TcpTunnel {
    /// Reserved `host:port` to bind, e.g. `1.tcp.ngrok.io:12345`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub remote_addr: String,

    /// Opaque user-supplied string shown by the ngrok API
    #[serde(skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_cidr: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deny_cidr: Vec<String>,
}

impl TunnelOptions for TcpTunnel {
    const KIND: TunnelKind = TunnelKind::Tcp;

    fn parse_directive(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        match directive.name.as_str() {
            "remote_addr" => self.remote_addr = directive.one_arg()?.to_string(),
            "metadata" => self.metadata = directive.one_arg()?.to_string(),
            "allow" => extend_list(&mut self.allow_cidr, directive)?,
            "deny" => extend_list(&mut self.deny_cidr, directive)?,
            _ => return Err(directive.unrecognized()),
        }
        Ok(())
    }

    fn assemble(&self) -> Result<Vec<EndpointOption>, ResourceError> {
        let mut options = Vec::new();
        push_text(&mut options, &self.remote_addr, EndpointOption::RemoteAddr);
        push_text(&mut options, &self.metadata, EndpointOption::Metadata);
        push_cidrs(&mut options, &self.allow_cidr, &self.deny_cidr);
        Ok(options)
    }
}

impl Replace for TcpTunnel {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.remote_addr.replace_with(replacer);
        self.metadata.replace_with(replacer);
        self.allow_cidr.replace_with(replacer);
        self.deny_cidr.replace_with(replacer);
    }
}

impl ValidateConfig for TcpTunnel {
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
