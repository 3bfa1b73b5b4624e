//! TLS tunnel

use super::{TunnelKind, TunnelOptions, certs, extend_list, push_cidrs, push_text};
use crate::caddyfile::Directive;
use crate::error::{ResourceError, SyntaxError};
use crate::options::EndpointOption;
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};

/// A TLS endpoint, optionally terminated at the edge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TlsTunnel {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub domain: String,

    #[serde(skip_serializing_if = "String::is_empty")]
    pub metadata: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_cidr: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deny_cidr: Vec<String>,

    /// Path to the PEM certificate chain used for edge termination
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cert: String,

    /// Path to the PEM private key matching `cert`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,

    /// Paths to PEM CA bundles for client certificate verification
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mutual_tls_cas: Vec<String>,
}

impl TunnelOptions for TlsTunnel {
    const KIND: TunnelKind = TunnelKind::Tls;

    fn parse_directive(&mut self, directive: &Directive) -> Result<(), SyntaxError> {
        match directive.name.as_str() {
            "domain" => self.domain = directive.one_arg()?.to_string(),
            "metadata" => self.metadata = directive.one_arg()?.to_string(),
            "allow" => extend_list(&mut self.allow_cidr, directive)?,
            "deny" => extend_list(&mut self.deny_cidr, directive)?,
            "cert" => self.cert = directive.one_arg()?.to_string(),
            "key" => self.key = directive.one_arg()?.to_string(),
            "mutual_tls_cas" => self.mutual_tls_cas.push(directive.one_arg()?.to_string()),
            _ => return Err(directive.unrecognized()),
        }
        Ok(())
    }

    fn assemble(&self) -> Result<Vec<EndpointOption>, ResourceError> {
        let mut options = Vec::new();
        push_text(&mut options, &self.domain, EndpointOption::Domain);
        push_text(&mut options, &self.metadata, EndpointOption::Metadata);
        push_cidrs(&mut options, &self.allow_cidr, &self.deny_cidr);

        if !self.cert.trim().is_empty() && !self.key.trim().is_empty() {
            options.push(certs::tls_termination(&self.cert, &self.key)?);
        }
        options.extend(certs::mutual_tls_cas(&self.mutual_tls_cas)?);
        Ok(options)
    }
}

impl Replace for TlsTunnel {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.domain.replace_with(replacer);
        self.metadata.replace_with(replacer);
        self.allow_cidr.replace_with(replacer);
        self.deny_cidr.replace_with(replacer);
        self.cert.replace_with(replacer);
        self.key.replace_with(replacer);
        self.mutual_tls_cas.replace_with(replacer);
    }
}

impl ValidateConfig for TlsTunnel {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_paired(&self.cert, "cert", &self.key, "key")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxErrorKind;

    #[test]
    fn test_parse_all_directives() {
        let tunnel = TlsTunnel::from_caddyfile(
            "tls {\n  domain foo.ngrok.app\n  metadata test\n  allow 10.0.0.0/8 10.2.0.0/16\n  deny 10.1.1.1/32\n  cert c.pem\n  key k.pem\n  mutual_tls_cas ca1.pem\n  mutual_tls_cas ca2.pem\n}",
        )
        .unwrap();

        assert_eq!(tunnel.domain, "foo.ngrok.app");
        assert_eq!(tunnel.metadata, "test");
        assert_eq!(tunnel.allow_cidr, vec!["10.0.0.0/8", "10.2.0.0/16"]);
        assert_eq!(tunnel.deny_cidr, vec!["10.1.1.1/32"]);
        assert_eq!(tunnel.cert, "c.pem");
        assert_eq!(tunnel.key, "k.pem");
        assert_eq!(tunnel.mutual_tls_cas, vec!["ca1.pem", "ca2.pem"]);
    }

    #[test]
    fn test_mutual_tls_cas_takes_one_path_per_line() {
        let err = TlsTunnel::from_caddyfile("tls {\n  mutual_tls_cas a.pem b.pem\n}").unwrap_err();
        assert!(matches!(err.kind, SyntaxErrorKind::ArgCount { got: 2, .. }));
    }

    #[test]
    fn test_cert_without_key_fails_validation() {
        let tunnel = TlsTunnel::from_caddyfile("tls {\n  cert c.pem\n}").unwrap();
        assert_eq!(
            tunnel.validate(),
            Err(ValidationError::Unpaired {
                present: "cert".to_string(),
                missing: "key".to_string(),
            })
        );

        let tunnel = TlsTunnel::from_caddyfile("tls {\n  key k.pem\n}").unwrap();
        assert!(tunnel.validate().is_err());
    }

    #[test]
    fn test_no_cert_emits_no_termination() {
        let tunnel = TlsTunnel::from_caddyfile("tls {\n  domain foo.ngrok.app\n}").unwrap();
        assert!(tunnel.validate().is_ok());
        assert_eq!(
            tunnel.assemble().unwrap(),
            vec![EndpointOption::Domain("foo.ngrok.app".to_string())]
        );
    }

    #[test]
    fn test_blank_cert_and_key_are_unset() {
        let tunnel = TlsTunnel {
            domain: " ".to_string(),
            cert: "  ".to_string(),
            key: "\t".to_string(),
            ..TlsTunnel::default()
        };
        assert!(tunnel.validate().is_ok());
        assert_eq!(tunnel.assemble().unwrap(), Vec::new());

        let tunnel = TlsTunnel {
            cert: "c.pem".to_string(),
            key: "  ".to_string(),
            ..TlsTunnel::default()
        };
        assert!(tunnel.validate().is_err());
    }

    #[test]
    fn test_unreadable_cert_is_resource_error() {
        let tunnel = TlsTunnel {
            cert: "/no/such/cert.pem".to_string(),
            key: "/no/such/key.pem".to_string(),
            ..TlsTunnel::default()
        };
        assert!(tunnel.validate().is_ok());
        assert!(matches!(
            tunnel.assemble(),
            Err(ResourceError::Read { .. })
        ));
    }
}
