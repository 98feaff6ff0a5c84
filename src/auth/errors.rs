//! Authentication error types.

use axum::response::{IntoResponse, Response};

use crate::db::CreateAccountError;
use crate::jwt::JwtError;

/// Errors returned by `AuthService`.
///
/// Every credential or refresh-token mismatch is reported as
/// `InvalidCredentials`, so callers cannot tell an unknown email from a wrong
/// password, or a replayed token from a logged-out session.
/// Infrastructure failures keep their own variants.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Account already exists")]
    DuplicateAccount,
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("token signing failed: {0}")]
    Token(#[from] JwtError),
    #[error("hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<CreateAccountError> for AuthError {
    fn from(e: CreateAccountError) -> Self {
        match e {
            CreateAccountError::Duplicate => AuthError::DuplicateAccount,
            CreateAccountError::Database(e) => AuthError::Database(e),
        }
    }
}

/// Why the request gate turned a request away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateErrorKind {
    NotAuthenticated,
    InvalidToken,
}

/// Gate rejection (returns JSON).
#[derive(Debug)]
pub struct GateRejection {
    pub(super) kind: GateErrorKind,
}

impl GateRejection {
    pub(super) fn new(kind: GateErrorKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> GateErrorKind {
        self.kind
    }

    fn message(&self) -> &'static str {
        match self.kind {
            GateErrorKind::NotAuthenticated => "Not authenticated",
            GateErrorKind::InvalidToken => "Invalid or expired token",
        }
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        use axum::Json;
        use axum::http::StatusCode;
        use serde::Serialize;

        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
