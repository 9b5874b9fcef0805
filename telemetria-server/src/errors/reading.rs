use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ReadingError {
    #[error("Query parameters \"inicio\" and \"fim\" are required and must be valid date-times")]
    InvalidRange,
}

impl ReadingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReadingError::InvalidRange => StatusCode::BAD_REQUEST,
        }
    }
}
