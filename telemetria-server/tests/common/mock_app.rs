use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::Router;
use jsonwebtoken::{EncodingKey, Header, encode};

use telemetria_server::configs::schema::SchemaManager;
use telemetria_server::configs::settings::{Auth, Database};
use telemetria_server::configs::storage::Storage;
use telemetria_server::handles::auth_handle::{AuthState, auth_router};
use telemetria_server::handles::reading_handle::{ReadingState, reading_router};
use telemetria_server::middlewares::TokenState;
use telemetria_server::models::user::User;
use telemetria_server::repositories::reading::ReadingRepository;
use telemetria_server::repositories::user::UserRepository;
use telemetria_server::services::auth_service::AuthService;
use telemetria_server::services::event_bus::EventBus;
use telemetria_server::services::token_service::{TokenClaims, TokenService};

pub const TEST_SECRET: &str = "test";

pub struct MockApp {
    pub router: Router,
    pub storage: Arc<Storage>,
    pub auth_service: Arc<AuthService>,
    pub token_service: Arc<TokenService>,
    pub event_bus: Arc<EventBus>,
    pub user_repository: Arc<UserRepository>,
    pub reading_repository: Arc<ReadingRepository>,
}

impl MockApp {
    pub async fn new() -> Self {
        let storage = Arc::new(
            Storage::new(
                Database {
                    clean_start: true,
                    url: String::from("sqlite::memory:"),
                },
                SchemaManager::default(),
            )
            .await
            .unwrap(),
        );

        let auth_service = Arc::new(AuthService::new());
        let token_service = Arc::new(TokenService::new(Auth {
            secret: String::from(TEST_SECRET),
            expiration: 3600,
        }));
        let event_bus = Arc::new(EventBus::new());
        let user_repository = Arc::new(UserRepository::new(storage.clone()));
        let reading_repository = Arc::new(ReadingRepository::new(storage.clone()));

        Self {
            router: Router::new(),
            storage,
            auth_service,
            token_service,
            event_bus,
            user_repository,
            reading_repository,
        }
    }

    pub fn with_auth_handle(mut self) -> Self {
        self.router = self.router.merge(auth_router(AuthState {
            auth_service: self.auth_service.clone(),
            token_service: self.token_service.clone(),
            user_repository: self.user_repository.clone(),
        }));

        self
    }

    pub fn with_reading_handle(mut self) -> Self {
        self.router = self.router.merge(reading_router(
            ReadingState {
                reading_repository: self.reading_repository.clone(),
                event_bus: self.event_bus.clone(),
            },
            TokenState {
                token_service: self.token_service.clone(),
            },
        ));

        self
    }

    pub async fn create_test_user(&self) -> User {
        let hash = self.auth_service.hash("password123").unwrap();
        let user = User {
            id: 0,
            username: String::from("test_user"),
            password: hash,
        };

        let id = self.user_repository.create(&user).await.unwrap();

        self.user_repository.find_by_id(id).await.unwrap().unwrap()
    }

    pub fn token_for(&self, user: &User) -> String {
        self.token_service.generate_token(user).unwrap().token
    }

    /// A token signed with the right secret whose expiry is far enough in the
    /// past to fail validation even with the default leeway.
    pub fn expired_token_for(&self, user: &User) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let claims = TokenClaims {
            sub: user.id,
            iat: now - 7200,
            exp: now - 3600,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_ref()),
        )
        .unwrap()
    }
}
