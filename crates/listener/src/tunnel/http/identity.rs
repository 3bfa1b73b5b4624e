//! OAuth and OpenID Connect edge authentication

use crate::caddyfile::Directive;
use crate::error::SyntaxError;
use crate::options::{EndpointOption, IdentityOption};
use crate::replace::{Replace, Replacer};
use crate::tunnel::extend_list;
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};

/// OAuth through a provider managed by ngrok
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OAuthConfig {
    /// Provider name such as `google` or `github`
    pub provider: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_emails: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_domains: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

/// OpenID Connect against a user supplied issuer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OidcConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_emails: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_domains: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

fn restrictions(emails: &[String], domains: &[String], scopes: &[String]) -> Vec<IdentityOption> {
    let mut options = Vec::new();
    if !emails.is_empty() {
        options.push(IdentityOption::AllowEmails(emails.to_vec()));
    }
    if !domains.is_empty() {
        options.push(IdentityOption::AllowDomains(domains.to_vec()));
    }
    if !scopes.is_empty() {
        options.push(IdentityOption::Scopes(scopes.to_vec()));
    }
    options
}

impl OAuthConfig {
    pub(crate) fn parse_block(&mut self, block: &[Directive]) -> Result<(), SyntaxError> {
        for directive in block {
            match directive.name.as_str() {
                "provider" => self.provider = directive.one_arg()?.to_string(),
                "allow_emails" => extend_list(&mut self.allow_emails, directive)?,
                "allow_domains" => extend_list(&mut self.allow_domains, directive)?,
                "scopes" => extend_list(&mut self.scopes, directive)?,
                _ => return Err(directive.unrecognized()),
            }
        }
        Ok(())
    }

    pub(crate) fn assemble(&self) -> EndpointOption {
        EndpointOption::OAuth {
            provider: self.provider.clone(),
            options: restrictions(&self.allow_emails, &self.allow_domains, &self.scopes),
        }
    }
}

impl OidcConfig {
    pub(crate) fn parse_block(&mut self, block: &[Directive]) -> Result<(), SyntaxError> {
        for directive in block {
            match directive.name.as_str() {
                "issuer_url" => self.issuer_url = directive.one_arg()?.to_string(),
                "client_id" => self.client_id = directive.one_arg()?.to_string(),
                "client_secret" => self.client_secret = directive.one_arg()?.to_string(),
                "allow_emails" => extend_list(&mut self.allow_emails, directive)?,
                "allow_domains" => extend_list(&mut self.allow_domains, directive)?,
                "scopes" => extend_list(&mut self.scopes, directive)?,
                _ => return Err(directive.unrecognized()),
            }
        }
        Ok(())
    }

    pub(crate) fn assemble(&self) -> EndpointOption {
        EndpointOption::Oidc {
            issuer_url: self.issuer_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            options: restrictions(&self.allow_emails, &self.allow_domains, &self.scopes),
        }
    }
}

impl Replace for OAuthConfig {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.provider.replace_with(replacer);
        self.allow_emails.replace_with(replacer);
        self.allow_domains.replace_with(replacer);
        self.scopes.replace_with(replacer);
    }
}

impl Replace for OidcConfig {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.issuer_url.replace_with(replacer);
        self.client_id.replace_with(replacer);
        self.client_secret.replace_with(replacer);
        self.allow_emails.replace_with(replacer);
        self.allow_domains.replace_with(replacer);
        self.scopes.replace_with(replacer);
    }
}

impl ValidateConfig for OAuthConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.provider, "provider")
            .map_err(|e| e.within("oauth"))
    }
}

impl ValidateConfig for OidcConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.issuer_url, "issuer_url")
            .and_then(|()| validators::validate_not_empty(&self.client_id, "client_id"))
            .and_then(|()| validators::validate_not_empty(&self.client_secret, "client_secret"))
            .map_err(|e| e.within("oidc"))
    }
}
