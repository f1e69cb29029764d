use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CatalogError {
    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored value could not be read back into its domain type
    #[error("Invalid stored data: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Whether `err` reports a violated UNIQUE or PRIMARY KEY constraint
pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Whether `err` reports a violated FOREIGN KEY constraint
pub(super) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}
