use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Expected 1 row affected, got {0}")]
    UnexpectedRowCount(u64),

    #[error("Invalid stored data: {0}")]
    Decode(String),

    /// The database could not be reached or prepared. Unrecoverable at startup.
    #[error("Schema initialization failed: {0}")]
    SchemaInit(String),
}
