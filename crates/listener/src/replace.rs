//! Deferred placeholder substitution
//!
//! Configuration values are stored exactly as written. Placeholders such as
//! `{env.NGROK_AUTHTOKEN}` are resolved once, after parsing and before
//! validation, by walking every string of the configuration with a
//! [`Replacer`].

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    /// `{env.NAME}` or `{$NAME}`; the name excludes braces
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(?:env\.|\$)([^{}]+)\}")
        .expect("placeholder pattern is a valid regex");
}

/// Resolves placeholders inside a single string
pub trait Replacer {
    /// Return `input` with every known placeholder substituted
    fn replace(&self, input: &str) -> String;
}

/// Configuration records whose strings can be substituted in place
///
/// Every string field, list element, header name and value is visited
/// exactly once. Lists keep their order and length.
pub trait Replace {
    fn replace_with(&mut self, replacer: &dyn Replacer);
}

impl Replace for String {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        *self = replacer.replace(self);
    }
}

impl<T: Replace> Replace for Vec<T> {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        for item in self {
            item.replace_with(replacer);
        }
    }
}

impl<T: Replace> Replace for Option<T> {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        if let Some(inner) = self {
            inner.replace_with(replacer);
        }
    }
}

impl<A: Replace, B: Replace> Replace for (A, B) {
    fn replace_with(&mut self, replacer: &dyn Replacer) {
        self.0.replace_with(replacer);
        self.1.replace_with(replacer);
    }
}

/// Leaves every string untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityReplacer;

impl Replacer for IdentityReplacer {
    fn replace(&self, input: &str) -> String {
        input.to_string()
    }
}

#[derive(Debug, Clone)]
enum Variables {
    Process,
    Fixed(HashMap<String, String>),
}

/// Substitutes `{env.NAME}` and `{$NAME}` placeholders
///
/// Placeholders naming a variable that is not set are left as written.
#[derive(Debug, Clone)]
pub struct EnvReplacer {
    variables: Variables,
}

impl EnvReplacer {
    /// Look variables up in the process environment
    pub const fn from_process_env() -> Self {
        Self {
            variables: Variables::Process,
        }
    }

    /// Look variables up in a fixed map
    pub fn from_map<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            variables: Variables::Fixed(
                variables
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match &self.variables {
            Variables::Process => std::env::var(name).ok(),
            Variables::Fixed(map) => map.get(name).cloned(),
        }
    }
}

impl Default for EnvReplacer {
    fn default() -> Self {
        Self::from_process_env()
    }
}

impl Replacer for EnvReplacer {
    fn replace(&self, input: &str) -> String {
        PLACEHOLDER
            .replace_all(input, |caps: &Captures<'_>| {
                self.lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}
