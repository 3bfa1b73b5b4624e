//! Option operations produced by provisioning
//!
//! A [`ListenPlan`] is the final, immutable result of loading a
//! configuration: the session options followed by the tunnel kind and its
//! endpoint options, in the order the tunnel client should apply them.

use crate::tunnel::TunnelKind;
use std::fmt;
use std::time::Duration;

/// Option applied to the ingress session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOption {
    Authtoken(String),
    /// No token configured; the client reads its own environment credential
    AuthtokenFromEnv,
    Metadata(String),
    Region(String),
    Server(String),
    HeartbeatInterval(Duration),
    HeartbeatTolerance(Duration),
}

/// Forwarding scheme of an HTTP endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Case-insensitive parse ignoring surrounding whitespace
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("http") {
            Some(Self::Http)
        } else if value.eq_ignore_ascii_case("https") {
            Some(Self::Https)
        } else {
            None
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Restriction applied inside an OAuth or OIDC option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOption {
    AllowEmails(Vec<String>),
    AllowDomains(Vec<String>),
    Scopes(Vec<String>),
}

/// A single header edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOption {
    Add { name: String, value: String },
    Remove(String),
}

/// Option applied to the tunnel endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum EndpointOption {
    RemoteAddr(String),
    Domain(String),
    Metadata(String),
    Scheme(Scheme),
    AllowCidr(Vec<String>),
    DenyCidr(Vec<String>),
    CircuitBreaker(f64),
    Compression,
    WebsocketTcpConversion,
    BasicAuth {
        username: String,
        password: String,
    },
    OAuth {
        provider: String,
        options: Vec<IdentityOption>,
    },
    Oidc {
        issuer_url: String,
        client_id: String,
        client_secret: String,
        options: Vec<IdentityOption>,
    },
    WebhookVerification {
        provider: String,
        secret: String,
    },
    RequestHeaders(Vec<HeaderOption>),
    ResponseHeaders(Vec<HeaderOption>),
    /// PEM contents of the certificate chain and private key
    TlsTermination {
        cert_pem: Vec<u8>,
        key_pem: Vec<u8>,
    },
    /// DER encoded CA certificates, in configuration order
    MutualTlsCas(Vec<Vec<u8>>),
    Label {
        name: String,
        value: String,
    },
}

impl EndpointOption {
    /// Stable name of the operation, as used in log output
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RemoteAddr(_) => "remote_addr",
            Self::Domain(_) => "domain",
            Self::Metadata(_) => "metadata",
            Self::Scheme(_) => "scheme",
            Self::AllowCidr(_) => "allow_cidr",
            Self::DenyCidr(_) => "deny_cidr",
            Self::CircuitBreaker(_) => "circuit_breaker",
            Self::Compression => "compression",
            Self::WebsocketTcpConversion => "websocket_tcp_conversion",
            Self::BasicAuth { .. } => "basic_auth",
            Self::OAuth { .. } => "oauth",
            Self::Oidc { .. } => "oidc",
            Self::WebhookVerification { .. } => "webhook_verification",
            Self::RequestHeaders(_) => "request_headers",
            Self::ResponseHeaders(_) => "response_headers",
            Self::TlsTermination { .. } => "tls_termination",
            Self::MutualTlsCas(_) => "mutual_tls_cas",
            Self::Label { .. } => "label",
        }
    }
}

const REDACTED: &str = "********";

impl fmt::Display for SessionOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authtoken(_) => write!(f, "authtoken {REDACTED}"),
            Self::AuthtokenFromEnv => write!(f, "authtoken from environment"),
            Self::Metadata(value) => write!(f, "metadata {value:?}"),
            Self::Region(value) => write!(f, "region {value}"),
            Self::Server(value) => write!(f, "server {value}"),
            Self::HeartbeatInterval(value) => write!(f, "heartbeat_interval {value:?}"),
            Self::HeartbeatTolerance(value) => write!(f, "heartbeat_tolerance {value:?}"),
        }
    }
}

impl fmt::Display for IdentityOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllowEmails(emails) => write!(f, "allow_emails [{}]", emails.join(", ")),
            Self::AllowDomains(domains) => write!(f, "allow_domains [{}]", domains.join(", ")),
            Self::Scopes(scopes) => write!(f, "scopes [{}]", scopes.join(", ")),
        }
    }
}

impl fmt::Display for HeaderOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { name, value } => write!(f, "+{name}: {value}"),
            Self::Remove(name) => write!(f, "-{name}"),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for EndpointOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Self::RemoteAddr(value) | Self::Domain(value) => write!(f, "{name} {value}"),
            Self::Metadata(value) => write!(f, "{name} {value:?}"),
            Self::Scheme(scheme) => write!(f, "{name} {}", scheme.as_str()),
            Self::AllowCidr(cidrs) | Self::DenyCidr(cidrs) => {
                write!(f, "{name} [{}]", cidrs.join(", "))
            }
            Self::CircuitBreaker(ratio) => write!(f, "{name} {ratio}"),
            Self::Compression | Self::WebsocketTcpConversion => f.write_str(name),
            Self::BasicAuth { username, .. } => write!(f, "{name} {username}:{REDACTED}"),
            Self::OAuth { provider, options } => {
                write!(f, "{name} {provider} [{}]", join(options))
            }
            Self::Oidc {
                issuer_url,
                client_id,
                options,
                ..
            } => write!(
                f,
                "{name} {issuer_url} client_id={client_id} client_secret={REDACTED} [{}]",
                join(options)
            ),
            Self::WebhookVerification { provider, .. } => {
                write!(f, "{name} {provider} secret={REDACTED}")
            }
            Self::RequestHeaders(edits) | Self::ResponseHeaders(edits) => {
                write!(f, "{name} [{}]", join(edits))
            }
            Self::TlsTermination { cert_pem, .. } => {
                write!(f, "{name} cert={} bytes key={REDACTED}", cert_pem.len())
            }
            Self::MutualTlsCas(cas) => write!(f, "{name} {} certificate(s)", cas.len()),
            Self::Label { name: label, value } => write!(f, "{name} {label}={value}"),
        }
    }
}

/// The tunnel flavor and its ordered endpoint options
#[derive(Debug, Clone, PartialEq)]
pub struct TunnelSpec {
    pub kind: TunnelKind,
    pub options: Vec<EndpointOption>,
}

/// Everything needed to open the listener
#[derive(Debug, Clone, PartialEq)]
pub struct ListenPlan {
    pub session: Vec<SessionOption>,
    pub tunnel: TunnelSpec,
}

impl fmt::Display for ListenPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "session:")?;
        for option in &self.session {
            writeln!(f, "  {option}")?;
        }
        writeln!(f, "tunnel {}:", self.tunnel.kind)?;
        for option in &self.tunnel.options {
            writeln!(f, "  {option}")?;
        }
        Ok(())
    }
}
