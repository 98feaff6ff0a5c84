//! Tests for the authentication endpoints and the bearer gate.

mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{
    create_test_app, create_test_app_with_secrets, credentials, post_bearer, post_json, send,
    signup, token_pair,
};
use std::time::Duration;
use tokenwarden::config::SecretStore;
use tokenwarden::jwt::TokenType;
use tower::ServiceExt;

const SIGNUP: &str = "/api/auth/local/signup";
const SIGNIN: &str = "/api/auth/local/signin";
const REFRESH: &str = "/api/auth/refresh";
const LOGOUT: &str = "/api/auth/logout";

#[tokio::test]
async fn test_signup_returns_created_pair() {
    let (app, db, signer) = create_test_app().await;

    let (status, body) = post_json(&app, SIGNUP, &credentials("a@x.com", "pw1")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["access_token"].is_string());
    assert!(body["refresh_token"].is_string());

    let pair = token_pair(body);
    let claims = signer.validate_access_token(&pair.access_token).unwrap();
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.token_type, TokenType::Access);

    let account = db.accounts().get_by_id(&claims.sub).await.unwrap().unwrap();
    assert_eq!(account.email, "a@x.com");
    assert_ne!(account.credential_hash, "pw1");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let (app, _db, _signer) = create_test_app().await;
    signup(&app, "a@x.com", "pw1").await;

    let (status, body) = post_json(&app, SIGNUP, &credentials("a@x.com", "other")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    // Email comparison ignores case
    let (status, _) = post_json(&app, SIGNUP, &credentials("A@X.com", "other")).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_distinct_emails_get_distinct_ids() {
    let (app, _db, signer) = create_test_app().await;
    let a = signup(&app, "a@x.com", "pw").await;
    let b = signup(&app, "b@x.com", "pw").await;

    let a_id = signer.validate_access_token(&a.access_token).unwrap().sub;
    let b_id = signer.validate_access_token(&b.access_token).unwrap().sub;
    assert_ne!(a_id, b_id);
}

#[tokio::test]
async fn test_signin_returns_ok_pair() {
    let (app, _db, signer) = create_test_app().await;
    let created = signup(&app, "a@x.com", "pw1").await;

    let (status, body) = post_json(&app, SIGNIN, &credentials("a@x.com", "pw1")).await;
    assert_eq!(status, StatusCode::OK);
    let pair = token_pair(body);

    assert_ne!(pair, created);
    assert_eq!(
        signer.validate_access_token(&pair.access_token).unwrap().sub,
        signer.validate_access_token(&created.access_token).unwrap().sub,
    );
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_are_indistinguishable() {
    let (app, _db, _signer) = create_test_app().await;
    signup(&app, "a@x.com", "pw1").await;

    let (wrong_status, wrong_body) =
        post_json(&app, SIGNIN, &credentials("a@x.com", "nope")).await;
    let (unknown_status, unknown_body) =
        post_json(&app, SIGNIN, &credentials("b@x.com", "pw1")).await;

    assert_eq!(wrong_status, StatusCode::FORBIDDEN);
    assert_eq!(unknown_status, StatusCode::FORBIDDEN);
    assert_eq!(wrong_body, unknown_body);
    assert_eq!(wrong_body["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_signin_with_long_password() {
    let (app, _db, _signer) = create_test_app().await;
    let long = "p".repeat(200);
    signup(&app, "a@x.com", &long).await;

    // Differs only past the 72nd byte
    let mut near = "p".repeat(199);
    near.push('q');
    let (status, _) = post_json(&app, SIGNIN, &credentials("a@x.com", &near)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = post_json(&app, SIGNIN, &credentials("a@x.com", &long)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_invalid_input_is_rejected() {
    let (app, _db, _signer) = create_test_app().await;

    for (email, password) in [
        ("", "pw1"),
        ("not-an-email", "pw1"),
        ("a@x", "pw1"),
        ("a b@x.com", "pw1"),
        ("a@x.com", ""),
    ] {
        let (status, body) = post_json(&app, SIGNUP, &credentials(email, password)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{:?} / {:?}", email, password);
        assert!(body["error"].is_string());
    }

    let (status, _) = post_json(&app, SIGNIN, &credentials("a@x.com", "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_email_is_trimmed() {
    let (app, _db, _signer) = create_test_app().await;
    signup(&app, "  a@x.com ", "pw1").await;

    let (status, _) = post_json(&app, SIGNIN, &credentials("a@x.com", "pw1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (app, _db, _signer) = create_test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri(SIGNUP)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"email": "a@x.com"}"#))
        .unwrap();

    // Rejection bodies are plain text, so skip the JSON helper
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, _db, _signer) = create_test_app().await;

    for uri in [LOGOUT, REFRESH] {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "Not authenticated");
    }
}

#[tokio::test]
async fn test_non_bearer_scheme_is_not_authenticated() {
    let (app, _db, _signer) = create_test_app().await;
    let pair = signup(&app, "a@x.com", "pw1").await;

    let request = Request::builder()
        .method("POST")
        .uri(LOGOUT)
        .header(header::AUTHORIZATION, format!("Basic {}", pair.access_token))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn test_garbage_token_is_rejected() {
    let (app, _db, _signer) = create_test_app().await;

    for uri in [LOGOUT, REFRESH] {
        let (status, body) = post_bearer(&app, uri, "not.a.jwt").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["error"], "Invalid or expired token");
    }
}

#[tokio::test]
async fn test_access_token_rejected_on_refresh() {
    let (app, _db, _signer) = create_test_app().await;
    let pair = signup(&app, "a@x.com", "pw1").await;

    let (status, body) = post_bearer(&app, REFRESH, &pair.access_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    // The refresh token is still usable afterwards
    let (status, _) = post_bearer(&app, REFRESH, &pair.refresh_token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_rejected_on_logout() {
    let (app, _db, _signer) = create_test_app().await;
    let pair = signup(&app, "a@x.com", "pw1").await;

    let (status, _) = post_bearer(&app, LOGOUT, &pair.refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_deployment_is_rejected() {
    let (app, _db, _signer) = create_test_app().await;
    let other = SecretStore::new(
        "another-access-secret-0123456789abcdef",
        "another-refresh-secret-0123456789abcdef",
    )
    .unwrap();
    let (other_app, _other_db, _other_signer) = create_test_app_with_secrets(other).await;
    let foreign = signup(&other_app, "a@x.com", "pw1").await;

    let (status, _) = post_bearer(&app, LOGOUT, &foreign.access_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = post_bearer(&app, REFRESH, &foreign.refresh_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_access_token_is_rejected() {
    let secrets = SecretStore::with_ttls(
        common::ACCESS_SECRET,
        common::REFRESH_SECRET,
        Duration::from_secs(1),
        Duration::from_secs(3600),
    )
    .unwrap();
    let (app, _db, _signer) = create_test_app_with_secrets(secrets).await;
    let pair = signup(&app, "a@x.com", "pw1").await;

    tokio::time::sleep(Duration::from_millis(2100)).await;

    let (status, body) = post_bearer(&app, LOGOUT, &pair.access_token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");

    // Refresh still works and hands out a fresh access token
    let (status, body) = post_bearer(&app, REFRESH, &pair.refresh_token).await;
    assert_eq!(status, StatusCode::OK);
    let pair = token_pair(body);
    let (status, _) = post_bearer(&app, LOGOUT, &pair.access_token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let (app, _db, _signer) = create_test_app().await;
    let (status, _) = post_json(&app, "/api/auth/local/nope", &credentials("a@x.com", "pw")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
