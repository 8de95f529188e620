//! Domain error types for Plaza.
//!
//! Handlers return these so callers can tell a missing entity or a
//! permission problem apart from a storage failure.

use thiserror::Error;

/// Errors returned by every social operation.
#[derive(Debug, Error)]
pub enum SocialError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid pagination cursor: {0}")]
    InvalidCursor(String),

    #[error("Operation failed: {0}")]
    OperationFailed(#[from] anyhow::Error),
}

impl SocialError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        SocialError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SocialError::NotFound { .. })
    }
}

impl From<rusqlite::Error> for SocialError {
    fn from(err: rusqlite::Error) -> Self {
        SocialError::OperationFailed(err.into())
    }
}

pub type SocialResult<T> = Result<T, SocialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = SocialError::not_found("Post", "p-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Post not found: p-1");
    }

    #[test]
    fn test_anyhow_converts_to_operation_failed() {
        let err: SocialError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, SocialError::OperationFailed(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
