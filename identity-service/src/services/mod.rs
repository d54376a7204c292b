//! Services layer: credential store port and adapters, token codec,
//! capability resolution, registration and authentication.

mod auth;
mod database;
pub mod error;
mod jwt;
mod memory;
mod registration;
pub mod resolver;
mod store;

pub use auth::AuthService;
pub use database::Database;
pub use error::ServiceError;
pub use jwt::{JwtService, Principal, SessionClaims, TokenError, TOKEN_ALGORITHM};
pub use memory::InMemoryCredentialStore;
pub use registration::RegistrationService;
pub use resolver::resolve_admin_services;
pub use store::{load_user_graph, CredentialStore, StoreError, UserGraph};
