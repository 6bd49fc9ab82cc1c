//! Errors raised while building or parsing domain values.

use thiserror::Error;

/// Rejections from domain constructors and parsers.
#[derive(Error, Debug, Clone)]
pub enum DomainError {
    /// A role, status or other value failed to parse or validate
    #[error("Validation error: {0}")]
    Validation(String),

    /// Password did not meet the strength rules
    #[error("Password error: {0}")]
    Password(String),

    /// Hashing backend failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn password(msg: impl Into<String>) -> Self {
        DomainError::Password(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        DomainError::Internal(msg.into())
    }
}

/// Result type alias for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            DomainError::validation("Unknown role 'wizard'").to_string(),
            "Validation error: Unknown role 'wizard'"
        );
        assert_eq!(
            DomainError::password("too short").to_string(),
            "Password error: too short"
        );
    }
}
