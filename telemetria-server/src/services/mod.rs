pub mod auth_service;
pub mod event_bus;
pub mod token_service;

pub use auth_service::AuthService;
pub use event_bus::{EventBus, ReadingEvent};
pub use token_service::{Token, TokenClaims, TokenService};
