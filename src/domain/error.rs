use thiserror::Error;

use crate::domain::user::Violation;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation failed: {} violation(s)", .violations.len())]
    ValidationFailed { violations: Vec<Violation> },

    #[error("Logic violation: {message}")]
    LogicViolation { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl DomainError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation_failed(violations: Vec<Violation>) -> Self {
        Self::ValidationFailed { violations }
    }

    pub fn logic(message: impl Into<String>) -> Self {
        Self::LogicViolation {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Violations carried by a `ValidationFailed` error, empty otherwise
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::ValidationFailed { violations } => violations,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::UserField;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("User not found [id=7]");
        assert_eq!(error.to_string(), "Not found: User not found [id=7]");
    }

    #[test]
    fn test_invalid_argument_error() {
        let error = DomainError::invalid_argument("User ID must be greater than 0");
        assert_eq!(
            error.to_string(),
            "Invalid argument: User ID must be greater than 0"
        );
    }

    #[test]
    fn test_validation_failed_counts_violations() {
        let error = DomainError::validation_failed(vec![
            Violation::new(UserField::Name, "This username contains restricted words.", "admin123"),
            Violation::new(UserField::Email, "This email is already in use.", "a@b.com"),
        ]);

        assert_eq!(error.to_string(), "Validation failed: 2 violation(s)");
        assert_eq!(error.violations().len(), 2);
    }

    #[test]
    fn test_violations_empty_for_other_errors() {
        let error = DomainError::logic("User is already deleted");
        assert!(error.violations().is_empty());
    }
}
