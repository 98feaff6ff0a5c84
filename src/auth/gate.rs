//! Request gate: decides per route whether a bearer token is required.
//!
//! Each route group is mounted with a `GateState` whose `public` flag says
//! whether it can be reached anonymously. Protected groups also name the
//! token type they accept. On success the verified `Caller` is stored in the
//! request extensions, where handlers pick it up with the `Caller` extractor.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use super::bearer::get_bearer_token;
use super::errors::{GateErrorKind, GateRejection};
use super::types::Caller;
use crate::jwt::{TokenSigner, TokenType};

#[derive(Clone)]
pub struct GateState {
    pub signer: Arc<TokenSigner>,
    /// Public routes are admitted without a token.
    pub public: bool,
    /// Token type required on protected routes.
    pub token_type: TokenType,
}

impl GateState {
    pub fn public(signer: Arc<TokenSigner>) -> Self {
        Self {
            signer,
            public: true,
            token_type: TokenType::Access,
        }
    }

    pub fn protected(signer: Arc<TokenSigner>, token_type: TokenType) -> Self {
        Self {
            signer,
            public: false,
            token_type,
        }
    }
}

/// Admit or reject a request based on its headers.
/// Returns `None` for public routes, the verified caller otherwise.
pub fn admit(state: &GateState, headers: &HeaderMap) -> Result<Option<Caller>, GateRejection> {
    if state.public {
        return Ok(None);
    }

    let token = get_bearer_token(headers)
        .ok_or(GateRejection::new(GateErrorKind::NotAuthenticated))?;

    let claims = state
        .signer
        .validate(state.token_type, token)
        .map_err(|e| {
            debug!(token_type = state.token_type.as_str(), error = %e, "Rejected bearer token");
            GateRejection::new(GateErrorKind::InvalidToken)
        })?;

    Ok(Some(Caller {
        user_id: claims.sub,
        email: claims.email,
        token: token.to_string(),
    }))
}

/// Middleware wrapping `admit`.
pub async fn gate(State(state): State<GateState>, mut request: Request, next: Next) -> Response {
    match admit(&state, request.headers()) {
        Ok(Some(caller)) => {
            request.extensions_mut().insert(caller);
            next.run(request).await
        }
        Ok(None) => next.run(request).await,
        Err(rejection) => rejection.into_response(),
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = GateRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or(GateRejection::new(GateErrorKind::NotAuthenticated))
    }
}
