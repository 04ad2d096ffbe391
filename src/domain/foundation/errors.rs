//! Error types for the domain layer.

use thiserror::Error;

/// Rejected configuration values and invalid state transitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: f64,
        max: f64,
        actual: f64,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub fn out_of_range(field: impl Into<String>, min: f64, max: f64, actual: f64) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_names_field_and_bounds() {
        let err = ValidationError::out_of_range("success_threshold", 1.0, 1000.0, 0.0);
        assert_eq!(
            err.to_string(),
            "Field 'success_threshold' must be between 1 and 1000, got 0"
        );
    }

    #[test]
    fn invalid_format_carries_reason() {
        let err = ValidationError::invalid_format("call_timeout", "must be non-zero");
        assert_eq!(err.to_string(), "Field 'call_timeout' has invalid format: must be non-zero");
    }
}
