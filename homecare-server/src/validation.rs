//! Request validation utilities for consistent validation across handlers
//!
//! Provides a `RequestValidation` trait and helper macros so every
//! create/update payload is checked the same way before it reaches the
//! domain crates.

use crate::error::ApiError;

/// Trait for validating request payloads
///
/// Implement this trait for all create/update request types to ensure
/// consistent validation across the API.
pub trait RequestValidation {
    /// Validates the request and returns an error if validation fails
    fn validate(&self) -> Result<(), ApiError>;
}

/// Macro for validating fields with custom predicates
///
/// # Usage
///
/// ```rust,ignore
/// validate_field!(self.name, !self.name.trim().is_empty(), "Name is required");
/// ```
#[macro_export]
macro_rules! validate_field {
    ($field:expr, $predicate:expr, $message:expr) => {
        if !$predicate {
            return Err($crate::error::ApiError::validation($message));
        }
    };
}

/// Macro for validating required fields (non-empty strings)
#[macro_export]
macro_rules! validate_required {
    ($field:expr, $message:expr) => {
        validate_field!($field, !$field.trim().is_empty(), $message);
    };
}

/// Macro for validating UUID fields (non-nil)
#[macro_export]
macro_rules! validate_uuid {
    ($field:expr, $message:expr) => {
        validate_field!($field, !$field.is_nil(), $message);
    };
}

/// Macro for validating string length
#[macro_export]
macro_rules! validate_length {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        let len = $field.len();
        validate_field!($field, len >= $min && len <= $max, $message);
    };
}

/// Macro for validating numeric sanity bounds on optional fields
///
/// # Usage
///
/// ```rust,ignore
/// validate_bounds!(self.heart_rate, 30, 200, "Heart rate must be between 30 and 200");
/// ```
#[macro_export]
macro_rules! validate_bounds {
    ($field:expr, $min:expr, $max:expr, $message:expr) => {
        if let Some(value) = $field {
            validate_field!($field, value >= $min && value <= $max, $message);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestRequest {
        name: String,
        heart_rate: Option<i32>,
    }

    impl RequestValidation for TestRequest {
        fn validate(&self) -> Result<(), ApiError> {
            validate_required!(self.name, "Name is required");
            validate_length!(self.name, 2, 100, "Name must be between 2 and 100 characters");
            validate_bounds!(
                self.heart_rate,
                30,
                200,
                "Heart rate must be between 30 and 200"
            );
            Ok(())
        }
    }

    #[test]
    fn valid_request_passes() {
        let request = TestRequest {
            name: "Daily check-in".to_string(),
            heart_rate: Some(72),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn blank_name_fails() {
        let request = TestRequest {
            name: "   ".to_string(),
            heart_rate: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn absent_optional_field_passes_bounds() {
        let request = TestRequest {
            name: "ok".to_string(),
            heart_rate: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn out_of_bounds_optional_field_fails() {
        let request = TestRequest {
            name: "ok".to_string(),
            heart_rate: Some(500),
        };
        assert!(request.validate().is_err());
    }
}
