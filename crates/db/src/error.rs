use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Connection not found: {0}")]
    ConnectionNotFound(Uuid),

    #[error("Run not found: {0}")]
    RunNotFound(Uuid),

    #[error("Corrupt value in {column}: {value}")]
    Decode { column: &'static str, value: String },
}

impl DbError {
    /// Whether this error means "the row does not exist" as opposed to an
    /// infrastructure failure. Callers use this to decide between a terminal
    /// not-found outcome and a retry.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound(_) | Self::ConnectionNotFound(_) | Self::RunNotFound(_)
        )
    }
}
