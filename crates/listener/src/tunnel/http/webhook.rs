use crate::caddyfile::Directive;
use crate::error::SyntaxError;
use crate::options::EndpointOption;
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};

/// Signature verification of incoming webhook requests
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WebhookVerificationConfig {
    /// Webhook sender, e.g. `github` or `stripe`
    pub provider: String,
    pub secret: String,
}

impl WebhookVerificationConfig {
    pub(crate) fn parse_block(&mut self, block: &[Directive]) -> Result<(), SyntaxError> {
        for directive in block {
            match directive.name.as_str() {
                "provider" => self.provider = directive.one_arg()?.to_string(),
                "secret" => self.secret = directive.one_arg()?.to_string(),
                _ => return Err(directive.unrecognized()),
            }
        }
        Ok(())
    }

    pub(crate) fn assemble(&self) -> EndpointOption {
        EndpointOption::WebhookVerification {
            provider: self.provider.clone(),
            secret: self.secret.clone(),
        }
    }
}

impl Replace for WebhookVerificationConfig {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.provider.replace_with(replacer);
        self.secret.replace_with(replacer);
    }
}

impl ValidateConfig for WebhookVerificationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_not_empty(&self.provider, "provider")
            .and_then(|()| validators::validate_not_empty(&self.secret, "secret"))
            .map_err(|e| e.within("webhook_verification"))
    }
}
