use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, header};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, Header};
use jsonwebtoken::errors::ErrorKind;

use crate::errors::{ApiError, AuthError};
use crate::services::TokenService;

#[derive(Clone)]
pub struct TokenState {
    pub token_service: Arc<TokenService>,
}

/// Gate in front of protected routes. A request with no Authorization header
/// is reported separately from one carrying a bad bearer token, so callers
/// can tell "never authenticated" apart from "rejected credentials".
pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if req.headers().get(header::AUTHORIZATION).is_none() {
        return Err(AuthError::MissingToken.into());
    }

    let mut headers = req.headers_mut().get_all(header::AUTHORIZATION).iter();

    let header: Authorization<Bearer> =
        Authorization::decode(&mut headers).map_err(|_| AuthError::InvalidToken)?;

    let token_data = state
        .token_service
        .retrieve_token_claims(header.token())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

    req.extensions_mut().insert(token_data.claims);

    Ok(next.run(req).await)
}
