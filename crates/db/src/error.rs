/// Failures raised by a [`StoreTx`](crate::StoreTx) implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness rule was violated. Carries the constraint name.
    #[error("Duplicate value violates unique constraint: {0}")]
    UniqueViolation(String),

    /// A row referenced by id does not exist.
    #[error("Missing referenced row: {0}")]
    MissingReference(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Whether this error is a unique-constraint violation (Postgres `23505`
    /// or the in-memory equivalent).
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StoreError::UniqueViolation(_) => true,
            StoreError::Database(sqlx::Error::Database(db_err)) => {
                db_err.code().as_deref() == Some("23505")
            }
            _ => false,
        }
    }
}
