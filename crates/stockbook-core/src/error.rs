//! # Error Types
//!
//! Domain-specific error types for stockbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockbook-core errors (this file)                                     │
//! │  ├── CoreError        - Record shaping / domain failures                │
//! │  ├── ValidationError  - One field failed one rule                       │
//! │  └── FieldErrors      - Every failing field of one form                 │
//! │                                                                         │
//! │  stockbook-query errors (separate crate)                               │
//! │  └── QueryError       - Network / HTTP / decode failures                │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ViewError        - Code + generic message shown to the user        │
//! │                                                                         │
//! │  Flow: ValidationError → FieldErrors → QueryError → ViewError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include the field name in every validation message
//! 3. Errors are `Clone` so one failure can be handed to several waiters

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core domain errors.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// An entity did not serialize to a JSON object, so it cannot be a record.
    ///
    /// ## When This Occurs
    /// - Exporting a list of scalars instead of entities
    /// - A newtype wrapper that serializes transparently to a string
    #[error("Value is not a record: serialized as {found}")]
    NotARecord { found: String },

    /// Serialization of an entity failed.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// A CSV row could not be decoded back into field values.
    #[error("Malformed CSV row: {0}")]
    MalformedRow(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A whole form failed validation.
    #[error("Invalid form: {0}")]
    InvalidForm(#[from] FieldErrors),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// They are raised before any request is built, so they never reach the
/// network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or positive.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., a price that is not a number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A derived amount no longer fits in a `Money`.
    #[error("{field} is too large")]
    TooLarge { field: String },
}

impl ValidationError {
    /// Returns the name of the field that failed.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. }
            | ValidationError::TooLarge { field } => field,
        }
    }
}

// =============================================================================
// Field Errors
// =============================================================================

/// Every failing field of a form, in the order the fields were checked.
///
/// Forms display these inline next to each input, so validation collects all
/// of them instead of stopping at the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(Vec<(String, ValidationError)>);

impl FieldErrors {
    /// Creates an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an error under a form key (e.g. `"quantity2"`).
    pub fn push(&mut self, key: impl Into<String>, error: ValidationError) {
        self.0.push((key.into(), error));
    }

    /// Records the error of a fallible check, if any.
    pub fn check(&mut self, key: impl Into<String>, result: Result<(), ValidationError>) {
        if let Err(e) = result {
            self.push(key, e);
        }
    }

    /// Returns the error registered for a form key.
    pub fn get(&self, key: &str) -> Option<&ValidationError> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, e)| e)
    }

    /// True when no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates `(form key, error)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.0.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Converts into `Ok(())` when empty.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "internCode".to_string(),
        };
        assert_eq!(err.to_string(), "internCode is required");
        assert_eq!(err.field(), "internCode");

        let err = ValidationError::MustBePositive {
            field: "price".to_string(),
        };
        assert_eq!(err.to_string(), "price must be positive");
    }

    #[test]
    fn test_field_errors_collects_all() {
        let mut errors = FieldErrors::new();
        errors.check("name", Ok(()));
        errors.push(
            "price",
            ValidationError::MustBePositive {
                field: "price".into(),
            },
        );
        errors.push(
            "quantity0",
            ValidationError::MustBePositive {
                field: "quantity".into(),
            },
        );

        assert_eq!(errors.len(), 2);
        assert!(errors.get("name").is_none());
        assert!(errors.get("quantity0").is_some());
        assert_eq!(errors.to_string(), "2 field(s) failed validation");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
