//! Error taxonomy for store operations.
//!
//! Validation and not-found errors are caller mistakes and always surface.
//! Storage errors only arise on the write path; read failures are recovered to
//! an empty collection inside [`crate::persistence::BlobStore`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A required input was missing or out of range after normalization.
    #[error("invalid {field}: {message}")]
    Validation { field: &'static str, message: String },

    /// The mutation target does not exist in the collection.
    #[error("{collection} record not found: {id}")]
    NotFound { collection: &'static str, id: String },

    /// The backend failed to persist a blob.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(collection: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Trim `value` and reject it when nothing is left.
pub fn require(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_trims_and_rejects_blank() {
        assert_eq!(require("name", "  Ada ").unwrap(), "Ada");
        let err = require("name", "   ").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "invalid name: must not be empty");
    }

    #[test]
    fn not_found_message_names_collection() {
        let err = StoreError::not_found("users", "abc");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "users record not found: abc");
    }
}
