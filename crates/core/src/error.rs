//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic parse/validation failures. Storage and
/// provider failures have their own error types in `hrportal-auth`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. empty after trimming).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A role name outside the closed role set.
    #[error("unknown role: '{0}'")]
    UnknownRole(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unknown_role(name: impl Into<String>) -> Self {
        Self::UnknownRole(name.into())
    }
}
