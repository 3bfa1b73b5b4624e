//! Shared building blocks for the ngrok listener crates
//!
//! Validation trait and helpers, the validation error type, the strict
//! duration grammar used by configuration files, and tracing setup.

pub mod duration;
pub mod error;
#[cfg(feature = "tracing")]
pub mod tracing;
pub mod validation;

pub use duration::{DurationError, parse_duration};
pub use error::{ValidationError, ValidationResult};
pub use validation::{ValidateConfig, validators};
