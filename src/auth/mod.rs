//! Authentication Module
//! Mission: Signed session tokens, revocable sessions, and refresh rotation

pub mod api;
pub mod gateway;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod session;
pub mod user_store;

pub use api::AuthState;
pub use gateway::{AuthError, AuthGateway};
pub use jwt::TokenCodec;
pub use middleware::{authenticate, AuthContext, AuthenticatorState};
pub use session::SessionStore;
pub use user_store::UserStore;
