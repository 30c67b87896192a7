use forkful_core::error::CoreError;
use forkful_core::types::DbId;
use forkful_db::StoreError;

/// Error returned by every service operation.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A domain rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The persistence layer failed. The transaction has been rolled back.
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        ServiceError::Core(CoreError::NotFound { entity, id })
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Core(core) => core.code(),
            ServiceError::Store(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show to callers. Internal failures are logged and
    /// replaced by a generic message.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Core(CoreError::Internal(msg)) => {
                tracing::error!(error = %msg, "Internal core error");
                "An internal error occurred".to_string()
            }
            ServiceError::Store(err) => {
                tracing::error!(error = %err, "Store error");
                "An internal error occurred".to_string()
            }
            ServiceError::Core(core) => core.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_do_not_leak() {
        let err = ServiceError::from(StoreError::UniqueViolation("uq_tags_global_name".into()));
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(!err.public_message().contains("uq_tags"));
    }

    #[test]
    fn core_errors_keep_their_code() {
        let err = ServiceError::from(CoreError::Conflict("stale".into()));
        assert_eq!(err.code(), "CONFLICT");
        assert_eq!(err.public_message(), "Conflict: stale");
        assert_eq!(ServiceError::not_found("Recipe", 3).code(), "NOT_FOUND");
    }
}
