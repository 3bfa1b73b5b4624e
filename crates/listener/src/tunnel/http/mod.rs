//! HTTP(S) tunnel and its edge modules

mod basic_auth;
mod headers;
mod identity;
mod webhook;

pub use basic_auth::{BasicAuthCredential, MIN_PASSWORD_LEN};
pub use headers::HeaderEdit;
pub use identity::{OAuthConfig, OidcConfig};
pub use webhook::WebhookVerificationConfig;

use super::{TunnelKind, TunnelOptions, certs, extend_list, push_cidrs, push_text};
use crate::caddyfile::Directive;
use crate::error::{ResourceError, SyntaxError};
use crate::options::{EndpointOption, Scheme};
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};

const SCHEMES: [&str; 2] = ["http", "https"];

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(value: &bool) -> bool {
    !*value
}

/// An HTTP endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpTunnel {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    /// `http` or `https`, checked after substitution
    #[serde(skip_serializing_if = "String::is_empty")]
    pub scheme: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_cidr: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deny_cidr: Vec<String>,

    /// Error ratio in `0.0..=1.0` above which requests are rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<f64>,

    #[serde(skip_serializing_if = "is_false")]
    pub compression: bool,

    #[serde(skip_serializing_if = "is_false")]
    pub websocket_tcp_conversion: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub basic_auth: Vec<BasicAuthCredential>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth: Option<OAuthConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub oidc: Option<OidcConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_verification: Option<WebhookVerificationConfig>,

    #[serde(skip_serializing_if = "HeaderEdit::is_empty")]
    pub request_headers: HeaderEdit,

    #[serde(skip_serializing_if = "HeaderEdit::is_empty")]
    pub response_headers: HeaderEdit,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mutual_tls_cas: Vec<String>,
}

impl TunnelOptions for HttpTunnel {
    const KIND: TunnelKind = TunnelKind::Http;

    fn parse_directive(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        match directive.name.as_str() {
            "domain" => self.domain = directive.one_arg()?.to_string(),
            "metadata" => self.metadata = directive.one_arg()?.to_string(),
            "scheme" => self.scheme = directive.one_arg()?.to_string(),
            "allow" => extend_list(&mut self.allow_cidr, directive)?,
            "deny" => extend_list(&mut self.deny_cidr, directive)?,
            "circuit_breaker" => {
                let raw = directive.one_arg()?;
                let ratio = raw
                    .parse::<f64>()
                    .map_err(|_| directive.invalid_value(raw, "expected a number"))?;
                self.circuit_breaker = Some(ratio);
            }
            "compression" => self.compression = directive.flag()?,
            "websocket_tcp_converter" | "websocket_tcp_conversion" => {
                self.websocket_tcp_conversion = directive.flag()?;
            }
            "basic_auth" => self
                .basic_auth
                .extend(BasicAuthCredential::parse(directive)?),
            "oauth" => {
                directive.no_args()?;
                self.oauth
                    .get_or_insert_with(OAuthConfig::default)
                    .parse_block(directive.block_entries())
                    .map_err(|e| e.within("oauth"))?;
            }
            "oidc" => {
                directive.no_args()?;
                self.oidc
                    .get_or_insert_with(OidcConfig::default)
                    .parse_block(directive.block_entries())
                    .map_err(|e| e.within("oidc"))?;
            }
            "webhook_verification" => {
                directive.no_args()?;
                self.webhook_verification
                    .get_or_insert_with(WebhookVerificationConfig::default)
                    .parse_block(directive.block_entries())
                    .map_err(|e| e.within("webhook_verification"))?;
            }
            "request_header" => self.request_headers.parse(directive)?,
            "header" | "response_header" => self.response_headers.parse(directive)?,
            "mutual_tls_cas" => self.mutual_tls_cas.push(directive.one_arg()?.to_string()),
            _ => return Err(directive.unrecognized()),
        }
        Ok(())
    }

    fn assemble(&self) -> Result<Vec<EndpointOption>, ResourceError> {
        let mut options = Vec::new();
        push_text(&mut options, &self.domain, EndpointOption::Domain);
        push_text(&mut options, &self.metadata, EndpointOption::Metadata);
        options.extend(Scheme::parse(&self.scheme).map(EndpointOption::Scheme));
        push_cidrs(&mut options, &self.allow_cidr, &self.deny_cidr);
        options.extend(self.circuit_breaker.map(EndpointOption::CircuitBreaker));

        if self.compression {
            options.push(EndpointOption::Compression);
        }
        if self.websocket_tcp_conversion {
            options.push(EndpointOption::WebsocketTcpConversion);
        }

        options.extend(
            self.basic_auth
                .iter()
                .map(|cred| EndpointOption::BasicAuth {
                    username: cred.username.clone(),
                    password: cred.password.clone(),
                }),
        );
        options.extend(self.oauth.as_ref().map(OAuthConfig::assemble));
        options.extend(self.oidc.as_ref().map(OidcConfig::assemble));
        options.extend(
            self.webhook_verification
                .as_ref()
                .map(WebhookVerificationConfig::assemble),
        );

        if !self.request_headers.is_empty() {
            options.push(EndpointOption::RequestHeaders(self.request_headers.assemble()));
        }
        if !self.response_headers.is_empty() {
            options.push(EndpointOption::ResponseHeaders(self.response_headers.assemble()));
        }

        options.extend(certs::mutual_tls_cas(&self.mutual_tls_cas)?);
        Ok(options)
    }
}

impl Replace for HttpTunnel {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.domain.replace_with(replacer);
        self.metadata.replace_with(replacer);
        self.scheme.replace_with(replacer);
        self.allow_cidr.replace_with(replacer);
        self.deny_cidr.replace_with(replacer);
        self.basic_auth.replace_with(replacer);
        self.oauth.replace_with(replacer);
        self.oidc.replace_with(replacer);
        self.webhook_verification.replace_with(replacer);
        self.request_headers.replace_with(replacer);
        self.response_headers.replace_with(replacer);
        self.mutual_tls_cas.replace_with(replacer);
    }
}

impl ValidateConfig for HttpTunnel {
    fn validate(&self) -> Result<(), ValidationError> {
        if !self.scheme.is_empty() {
            validators::validate_one_of(&self.scheme, &SCHEMES, "scheme")?;
        }
        if let Some(ratio) = self.circuit_breaker {
            validators::validate_range(ratio, 0.0, 1.0, "circuit_breaker")?;
        }
        for credential in &self.basic_auth {
            credential.validate()?;
        }
        self.oauth.validate()?;
        self.oidc.validate()?;
        self.webhook_verification.validate()
    }
}
