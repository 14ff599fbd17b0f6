//! Error types for the database layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Duplicate(String),

    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Wrap a query error, turning UNIQUE violations into `Duplicate`.
    pub fn unique_or(error: sqlx::Error, duplicate_message: impl Into<String>) -> Self {
        if is_unique_violation(&error) {
            Self::Duplicate(duplicate_message.into())
        } else {
            Self::Query(error)
        }
    }
}

pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}
