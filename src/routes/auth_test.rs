use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::Request;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use tower::ServiceExt;

use super::*;
use crate::routes::app;
use crate::services::credentials::DUPLICATE_EMAIL_MESSAGE;
use crate::state::test_helpers::{self, MockAuthProvider, MockBackend};

fn state_with(auth: MockAuthProvider) -> (AppState, Arc<MockAuthProvider>) {
    let auth = Arc::new(auth);
    let state = test_helpers::test_app_state_with(auth.clone(), Arc::new(MockBackend::new()));
    (state, auth)
}

async fn post_json(state: AppState, path: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app(state).oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_owned))
        .collect()
}

// =============================================================================
// cookie helpers
// =============================================================================

#[test]
fn session_cookies_are_http_only_lax() {
    let tokens = SessionTokens { access_token: "a".into(), refresh_token: "r".into(), expires_in: Some(3600) };
    let jar = set_session_cookies(CookieJar::new(), &tokens, true);

    let access = jar.get(ACCESS_COOKIE).unwrap();
    assert_eq!(access.value(), "a");
    assert_eq!(access.http_only(), Some(true));
    assert_eq!(access.secure(), Some(true));
    assert_eq!(access.same_site(), Some(SameSite::Lax));
    assert_eq!(access.path(), Some("/"));
    assert_eq!(access.max_age(), Some(Duration::seconds(3600)));

    let refresh = jar.get(REFRESH_COOKIE).unwrap();
    assert_eq!(refresh.value(), "r");
    assert_eq!(refresh.max_age(), Some(Duration::days(REFRESH_COOKIE_MAX_AGE_DAYS)));
}

#[test]
fn access_cookie_without_expiry_is_session_cookie() {
    let tokens = SessionTokens { access_token: "a".into(), refresh_token: "r".into(), expires_in: None };
    let jar = set_session_cookies(CookieJar::new(), &tokens, false);
    assert_eq!(jar.get(ACCESS_COOKIE).unwrap().max_age(), None);
    assert_eq!(jar.get(ACCESS_COOKIE).unwrap().secure(), Some(false));
}

#[test]
fn cleared_cookies_expire_immediately() {
    let jar = clear_session_cookies(CookieJar::new(), false);
    for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
        let cookie = jar.get(name).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}

#[test]
fn auth_error_statuses() {
    assert_eq!(auth_error_to_status(&AuthProviderError::Unauthorized), StatusCode::UNAUTHORIZED);
    assert_eq!(
        auth_error_to_status(&AuthProviderError::Rejected { status: 422, message: "weak".into() }),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(auth_error_to_status(&AuthProviderError::Request("refused".into())), StatusCode::BAD_GATEWAY);
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_sets_cookies_and_returns_user() {
    let (state, _) = state_with(MockAuthProvider::new().with_account("ada@example.com", "secret1", "user-ada"));
    let response = post_json(
        state,
        "/api/auth/login",
        serde_json::json!({ "email": "  Ada@Example.com ", "password": "secret1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("session_token=access-user-ada")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=refresh-user-ada")));
    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], "user-ada");
}

#[tokio::test]
async fn login_over_stale_cookies_keeps_new_session() {
    let (state, _) = state_with(MockAuthProvider::new().with_account("ada@example.com", "secret1", "user-ada"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(CONTENT_TYPE, "application/json")
        .header(COOKIE, "session_token=expired; refresh_token=revoked")
        .body(Body::from(serde_json::json!({ "email": "ada@example.com", "password": "secret1" }).to_string()))
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("session_token=access-user-ada")));
    assert!(!cookies.iter().any(|c| c.starts_with("session_token=;")));
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let (state, _) = state_with(MockAuthProvider::new().with_account("ada@example.com", "secret1", "user-ada"));
    let response = post_json(
        state,
        "/api/auth/login",
        serde_json::json!({ "email": "ada@example.com", "password": "nope" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["error"], "Invalid login credentials");
}

#[tokio::test]
async fn login_with_invalid_email_is_bad_request() {
    let (state, _) = state_with(MockAuthProvider::new());
    let response = post_json(state, "/api/auth/login", serde_json::json!({ "email": "nope", "password": "x" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_provider_outage_is_bad_gateway() {
    let (state, _) = state_with(MockAuthProvider::new().unavailable());
    let response = post_json(
        state,
        "/api/auth/login",
        serde_json::json!({ "email": "ada@example.com", "password": "secret1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

// =============================================================================
// sign-up
// =============================================================================

#[tokio::test]
async fn sign_up_pending_confirmation() {
    let (state, auth) = state_with(MockAuthProvider::new());
    let response = post_json(
        state,
        "/api/auth/sign-up",
        serde_json::json!({ "email": "new@example.com", "password": "secret1", "confirm_password": "secret1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["redirect"], "/auth/sign-up-success");
    assert_eq!(auth.sign_up_redirects(), vec![Some("http://app.test/auth/sign-up-success".to_owned())]);
}

#[tokio::test]
async fn sign_up_confirmed_sets_cookies() {
    let (state, _) = state_with(MockAuthProvider::new().auto_confirm());
    let response = post_json(
        state,
        "/api/auth/sign-up",
        serde_json::json!({ "email": "new@example.com", "password": "secret1", "confirmPassword": "secret1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["status"], "confirmed");
}

#[tokio::test]
async fn sign_up_short_password() {
    let (state, auth) = state_with(MockAuthProvider::new());
    let response = post_json(
        state,
        "/api/auth/sign-up",
        serde_json::json!({ "email": "new@example.com", "password": "abc", "confirm_password": "abc" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Password must be at least 6 characters");
    assert!(auth.sign_up_redirects().is_empty());
}

#[tokio::test]
async fn sign_up_password_mismatch() {
    let (state, _) = state_with(MockAuthProvider::new());
    let response = post_json(
        state,
        "/api/auth/sign-up",
        serde_json::json!({ "email": "new@example.com", "password": "secret1", "confirm_password": "secret2" }),
    )
    .await;
    assert_eq!(body_json(response).await["error"], "Passwords do not match");
}

#[tokio::test]
async fn sign_up_duplicate_email_message() {
    let (state, _) = state_with(MockAuthProvider::new().rejecting_sign_up("User already registered"));
    let response = post_json(
        state,
        "/api/auth/sign-up",
        serde_json::json!({ "email": "old@example.com", "password": "secret1", "confirm_password": "secret1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], DUPLICATE_EMAIL_MESSAGE);
}

// =============================================================================
// logout and me
// =============================================================================

#[tokio::test]
async fn logout_revokes_and_clears() {
    let (state, auth) = state_with(MockAuthProvider::new().with_session("good", "user-1"));
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .header(COOKIE, "session_token=good; refresh_token=r")
        .body(Body::empty())
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(auth.signed_out(), vec!["good".to_owned()]);
    let cookies = set_cookies(&response);
    assert!(cookies.iter().any(|c| c.starts_with("session_token=;")));
    assert!(cookies.iter().any(|c| c.starts_with("refresh_token=;")));
}

#[tokio::test]
async fn logout_without_session_still_clears() {
    let (state, auth) = state_with(MockAuthProvider::new());
    let request = Request::builder()
        .method("POST")
        .uri("/api/auth/logout")
        .body(Body::empty())
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(auth.signed_out().is_empty());
    assert_eq!(set_cookies(&response).len(), 2);
}

#[tokio::test]
async fn me_returns_current_user() {
    let (state, _) = state_with(MockAuthProvider::new().with_session("good", "user-1"));
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(COOKIE, "session_token=good")
        .body(Body::empty())
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["id"], "user-1");
}

#[tokio::test]
async fn me_without_session_is_unauthorized() {
    let (state, _) = state_with(MockAuthProvider::new());
    let request = Request::builder()
        .uri("/api/auth/me")
        .header(COOKIE, "session_token=stale")
        .body(Body::empty())
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
