//! Authentication endpoints.
//!
//! - POST `/local/signup` - Create an account (public)
//! - POST `/local/signin` - Exchange email and password for tokens (public)
//! - POST `/logout` - End the session (access token)
//! - POST `/refresh` - Rotate the refresh token (refresh token)

use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::post,
};
use std::sync::Arc;

use super::error::{ApiError, validate_email, validate_password};
use crate::auth::{AuthService, Caller, Credentials, GateState, gate};
use crate::jwt::{TokenPair, TokenSigner, TokenType};

#[derive(Clone)]
pub struct AuthState {
    pub service: AuthService,
}

pub fn router(state: AuthState, signer: Arc<TokenSigner>) -> Router {
    let public = Router::new()
        .route("/local/signup", post(signup))
        .route("/local/signin", post(signin))
        .with_state(state.clone())
        .route_layer(middleware::from_fn_with_state(
            GateState::public(signer.clone()),
            gate,
        ));

    let access = Router::new()
        .route("/logout", post(logout))
        .with_state(state.clone())
        .route_layer(middleware::from_fn_with_state(
            GateState::protected(signer.clone(), TokenType::Access),
            gate,
        ));

    let refresh = Router::new()
        .route("/refresh", post(refresh_tokens))
        .with_state(state)
        .route_layer(middleware::from_fn_with_state(
            GateState::protected(signer, TokenType::Refresh),
            gate,
        ));

    Router::new().merge(public).merge(access).merge(refresh)
}

fn validated(payload: Credentials) -> Result<Credentials, ApiError> {
    let email = validate_email(&payload.email)?.to_string();
    validate_password(&payload.password)?;
    Ok(Credentials {
        email,
        password: payload.password,
    })
}

async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = validated(payload)?;
    let pair: TokenPair = state.service.signup(&credentials).await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

async fn signin(
    State(state): State<AuthState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError> {
    let credentials = validated(payload)?;
    let pair = state.service.signin(&credentials).await?;
    Ok((StatusCode::OK, Json(pair)))
}

async fn logout(
    State(state): State<AuthState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    state.service.logout(&caller.user_id).await?;
    Ok(StatusCode::OK)
}

/// Identity and presented token both come from the verified refresh token.
async fn refresh_tokens(
    State(state): State<AuthState>,
    caller: Caller,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state
        .service
        .refresh_tokens(&caller.user_id, &caller.token)
        .await?;
    Ok((StatusCode::OK, Json(pair)))
}
