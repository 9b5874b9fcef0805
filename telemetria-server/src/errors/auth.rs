use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Username already exists")]
    UsernameExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token not provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UsernameExists => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials => StatusCode::BAD_REQUEST,
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::FORBIDDEN,
            AuthError::TokenExpired => StatusCode::FORBIDDEN,
        }
    }
}
