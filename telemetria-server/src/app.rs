use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::configs::{SchemaManager, Settings, Storage};
use crate::handles::{AuthState, ReadingState, WsState, auth_router, reading_router, ws_router};
use crate::middlewares::TokenState;
use crate::repositories::{ReadingRepository, UserRepository};
use crate::services::{AuthService, EventBus, TokenService};

pub async fn create_app(settings: &Arc<Settings>) -> Router {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default())
            .await
            .unwrap(),
    );

    let user_repository = Arc::new(UserRepository::new(storage.clone()));
    let reading_repository = Arc::new(ReadingRepository::new(storage.clone()));

    let auth_service = Arc::new(AuthService::new());
    let token_service = Arc::new(TokenService::new(settings.auth.clone()));
    let event_bus = Arc::new(EventBus::new());

    let token_state = TokenState {
        token_service: token_service.clone(),
    };

    Router::new()
        .merge(auth_router(AuthState {
            auth_service,
            token_service,
            user_repository,
        }))
        .merge(reading_router(
            ReadingState {
                reading_repository,
                event_bus: event_bus.clone(),
            },
            token_state,
        ))
        .merge(ws_router(WsState { event_bus }))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
