use crate::caddyfile::Directive;
use crate::error::{Arity, SyntaxError};
use crate::replace::{Replace, Replacer};
use ngrok_listener_core::{ValidateConfig, ValidationError, validators};
use serde::{Deserialize, Serialize};

/// Minimum password length accepted by the ingress service
pub const MIN_PASSWORD_LEN: usize = 8;

/// A username and password for HTTP basic authentication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BasicAuthCredential {
    pub username: String,
    pub password: String,
}

impl BasicAuthCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read `basic_auth user pass` or a `basic_auth { user pass ... }` block
    pub(crate) fn parse(directive: &Directive) -> Result<Vec<Self>, SyntaxError> {
        let entries = directive.entries()?;
        if entries.is_empty() {
            return Err(directive.arg_count(Arity::Two));
        }

        entries
            .iter()
            .map(|entry| match entry.tokens.as_slice() {
                [username, password] => Ok(Self::new(*username, *password)),
                _ => Err(entry.arg_count(Arity::Two)),
            })
            .collect()
    }
}

impl Replace for BasicAuthCredential {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.username.replace_with(replacer);
        self.password.replace_with(replacer);
    }
}

impl ValidateConfig for BasicAuthCredential {
    fn validate(&self) -> Result<(), ValidationError> {
        validators::validate_min_len(&self.password, MIN_PASSWORD_LEN, "password")
            .map_err(|e| e.within(format!("basic_auth user {:?}", self.username)))
    }
}
