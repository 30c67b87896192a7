use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    #[error("{entity} has already been decided (status: {status})")]
    AlreadyDecided {
        entity: &'static str,
        status: &'static str,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::NotFound { .. } => "NOT_FOUND",
            CoreError::Validation(_) => "INVALID_INPUT",
            CoreError::LimitExceeded(_) => "LIMIT_EXCEEDED",
            CoreError::Conflict(_) => "CONFLICT",
            CoreError::Forbidden(_) => "PERMISSION_DENIED",
            CoreError::AlreadyDecided { .. } => "ALREADY_DECIDED",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}
