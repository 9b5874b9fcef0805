use super::{AuthError, ReadingError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication error: {0}")]
    AuthError(#[from] AuthError),

    #[error("Reading error: {0}")]
    ReadingError(#[from] ReadingError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
