use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::errors::{ApiError, AuthError};
use crate::models::User;
use crate::repositories::UserRepository;
use crate::services::{AuthService, TokenService};

#[derive(Clone)]
pub struct AuthState {
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub user_repository: Arc<UserRepository>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterBody {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginBody {
    pub username: String,
    pub password: String,
}

pub fn auth_router(auth_state: AuthState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .with_state(auth_state)
}

pub async fn register(
    State(state): State<AuthState>,
    Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let hash_password = state
        .auth_service
        .hash(&body.password)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;

    let user = User {
        id: 0,
        username: body.username.clone(),
        password: hash_password,
    };

    // The UNIQUE constraint on username is the authority here; a violation
    // means the name is taken, anything else is a storage fault.
    match state.user_repository.create(&user).await {
        Ok(_) => Ok((
            StatusCode::CREATED,
            Json(json!({ "message": "User registered successfully" })),
        )),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AuthError::UsernameExists.into())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(
    State(state): State<AuthState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, ApiError> {
    // Unknown username and wrong password produce the same failure so the
    // endpoint cannot be used to probe which usernames exist.
    let user = state
        .user_repository
        .find_by_username(&body.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    let valid = state
        .auth_service
        .verify(&user, &body.password)
        .map_err(|e| anyhow!("Failed to verify password: {}", e))?;

    if !valid {
        return Err(AuthError::InvalidCredentials.into());
    }

    let token = state
        .token_service
        .generate_token(&user)
        .map_err(|e| anyhow!("Failed to generate token: {}", e))?
        .token;

    Ok(Json(json!({ "message": "Login successful", "token": token })))
}
