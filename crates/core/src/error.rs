//! Validation errors shared across crates

use thiserror::Error;

/// Standard result type for validation
pub type ValidationResult = std::result::Result<(), ValidationError>;

/// A configuration value that breaks a domain constraint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{field}` cannot be empty")]
    Empty { field: String },

    #[error("`{field}` must be at least {min} bytes long")]
    TooShort { field: String, min: usize },

    #[error("unrecognized {field}: {value:?} (expected one of: {})", .allowed.join(", "))]
    Unrecognized {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("`{missing}` is required when `{present}` is set")]
    Unpaired { present: String, missing: String },

    #[error("{what} is required")]
    Required { what: String },

    #[error("`{field}` must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    #[error("{context}: {inner}")]
    Context {
        context: String,
        inner: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Create an empty-field error
    pub fn empty(field: impl Into<String>) -> Self {
        Self::Empty {
            field: field.into(),
        }
    }

    /// Create a missing-value error
    pub fn required(what: impl Into<String>) -> Self {
        Self::Required { what: what.into() }
    }

    /// Prefix the error with the section it was raised in
    #[must_use]
    pub fn within(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            inner: Box::new(self),
        }
    }

    /// The innermost error, without any section prefixes
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { inner, .. } => inner.root(),
            other => other,
        }
    }
}
