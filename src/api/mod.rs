mod auth;
mod error;

use axum::Router;
use std::sync::Arc;

use crate::auth::AuthService;
use crate::jwt::TokenSigner;

pub use auth::AuthState;
pub use error::ApiError;

/// Create the API router.
pub fn create_api_router(service: AuthService, signer: Arc<TokenSigner>) -> Router {
    let auth_state = auth::AuthState { service };

    Router::new().nest("/auth", auth::router(auth_state, signer))
}
