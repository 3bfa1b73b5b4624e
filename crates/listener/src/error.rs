//! Error types for listener configuration loading

use ngrok_listener_core::{DurationError, ValidationError};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for listener configuration operations
pub type Result<T> = std::result::Result<T, ListenerError>;

/// Errors that can occur while loading and provisioning a listener
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Block syntax or directive shape error
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    /// Domain constraint violation
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// Certificate, key or CA file error
    #[error("provisioning failed: {0}")]
    Resource(#[from] ResourceError),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Tool settings error
    #[cfg(feature = "cli")]
    #[error("settings error: {0}")]
    Settings(#[from] config::ConfigError),
}

/// Number of arguments a directive accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// No arguments at all
    None,
    /// No argument, or a single boolean literal
    Flag,
    /// Exactly one argument
    One,
    /// Zero or one argument
    AtMostOne,
    /// One or more arguments
    AtLeastOne,
    /// Exactly two arguments
    Two,
    /// A field name followed by an optional value
    NameAndValue,
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::None => "no arguments",
            Self::Flag => "no argument or a boolean",
            Self::One => "exactly one argument",
            Self::AtMostOne => "at most one argument",
            Self::AtLeastOne => "at least one argument",
            Self::Two => "exactly two arguments",
            Self::NameAndValue => "a field name and an optional value",
        };
        f.write_str(text)
    }
}

/// What went wrong while reading block syntax or a tunnel document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unrecognized directive `{0}`")]
    UnrecognizedDirective(String),

    #[error("`{directive}` takes {expected}, got {got}")]
    ArgCount {
        directive: String,
        expected: Arity,
        got: usize,
    },

    #[error("`{0}` cannot be given both inline arguments and a block")]
    CombinedForm(String),

    #[error("`{directive}` does not support {operation}")]
    UnsupportedOperation { directive: String, operation: String },

    #[error("unknown tunnel type `{name}` (expected one of: {})", .known.join(", "))]
    UnknownTunnelType { name: String, known: Vec<String> },

    #[error("`{directive}`: {reason}")]
    DurationParse {
        directive: String,
        reason: DurationError,
    },

    #[error("invalid value {value:?} for `{directive}`: {reason}")]
    InvalidValue {
        directive: String,
        value: String,
        reason: String,
    },

    #[error("`{0}` does not take a block")]
    UnexpectedBlock(String),

    #[error("unterminated quoted string")]
    UnterminatedQuote,

    #[error("unbalanced braces: {0}")]
    UnbalancedBrace(String),

    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),
}

/// A syntax error with the line it was found on and the enclosing blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// 1-based line, absent for errors raised outside block syntax
    pub line: Option<usize>,
    /// Enclosing block names, outermost first
    pub scope: Vec<String>,
}

impl SyntaxError {
    pub const fn new(kind: SyntaxErrorKind, line: usize) -> Self {
        Self {
            kind,
            line: Some(line),
            scope: Vec::new(),
        }
    }

    /// An error that is not tied to a source line
    pub const fn detached(kind: SyntaxErrorKind) -> Self {
        Self {
            kind,
            line: None,
            scope: Vec::new(),
        }
    }

    /// Attach a line number unless one is already recorded
    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line.get_or_insert(line);
        self
    }

    /// Record that the error happened inside the named block
    #[must_use]
    pub fn within(mut self, block: impl Into<String>) -> Self {
        self.scope.insert(0, block.into());
        self
    }

    pub const fn kind(&self) -> &SyntaxErrorKind {
        &self.kind
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.scope.is_empty() {
            write!(f, "{}: ", self.scope.join(" > "))?;
        }
        if let Some(line) = self.line {
            write!(f, "line {line}: ")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for SyntaxError {}

/// A file named by the configuration could not be used
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("reading {field} file {}: {source}", .path.display())]
    Read {
        field: String,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{field} file {} holds no usable certificate: {reason}", .path.display())]
    Certificate {
        field: String,
        path: PathBuf,
        reason: String,
    },
}

impl ResourceError {
    /// Name of the configuration field that pointed at the file
    pub fn field(&self) -> &str {
        match self {
            Self::Read { field, .. } | Self::Certificate { field, .. } => field,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Certificate { path, .. } => path,
        }
    }
}
