//! Configuration validation support

use crate::error::ValidationError;

/// Trait for validating configuration values
pub trait ValidateConfig {
    /// Validate the configuration
    ///
    /// Returns Ok(()) if valid, or the first constraint that does not hold,
    /// checked in field order.
    fn validate(&self) -> Result<(), ValidationError>;
}

impl<T: ValidateConfig> ValidateConfig for Option<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

/// Common validation helpers
pub mod validators {
    use crate::error::ValidationError;
    use std::fmt::Display;

    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            return Err(ValidationError::empty(field));
        }
        Ok(())
    }

    /// Validate that a string is at least `min` bytes long
    pub fn validate_min_len(value: &str, min: usize, field: &str) -> Result<(), ValidationError> {
        if value.len() < min {
            return Err(ValidationError::TooShort {
                field: field.to_string(),
                min,
            });
        }
        Ok(())
    }

    /// Validate that a value matches one of the allowed words, ignoring case
    /// and surrounding whitespace
    pub fn validate_one_of(
        value: &str,
        allowed: &[&str],
        field: &str,
    ) -> Result<(), ValidationError> {
        let normalized = value.trim();
        if allowed
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(normalized))
        {
            return Ok(());
        }
        Err(ValidationError::Unrecognized {
            field: field.to_string(),
            value: value.to_string(),
            allowed: allowed.iter().map(ToString::to_string).collect(),
        })
    }

    /// Validate that two settings are either both set or both unset
    pub fn validate_paired(
        first: &str,
        first_field: &str,
        second: &str,
        second_field: &str,
    ) -> Result<(), ValidationError> {
        match (first.trim().is_empty(), second.trim().is_empty()) {
            (false, true) => Err(ValidationError::Unpaired {
                present: first_field.to_string(),
                missing: second_field.to_string(),
            }),
            (true, false) => Err(ValidationError::Unpaired {
                present: second_field.to_string(),
                missing: first_field.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Validate that a collection holds at least one entry
    pub fn validate_present<T>(items: &[T], what: &str) -> Result<(), ValidationError> {
        if items.is_empty() {
            return Err(ValidationError::required(what));
        }
        Ok(())
    }

    /// Validate that a value is within range
    pub fn validate_range<T: PartialOrd + Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> Result<(), ValidationError> {
        // NaN fails both comparisons
        if !(value >= min && value <= max) {
            return Err(ValidationError::OutOfRange {
                field: field.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }
}
