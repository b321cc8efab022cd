//! Auth routes — email/password sign-in, sign-up, logout and session cookies.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use time::Duration;
use tracing::{info, warn};

use super::error_response;
use crate::config::SIGN_UP_SUCCESS_PATH;
use crate::identity::{AuthProviderError, SessionTokens, SessionUser, SignUpOutcome};
use crate::services::credentials::{self, CredentialError};
use crate::services::session::{ACCESS_COOKIE, REFRESH_COOKIE, SessionCookies, SessionLookup, resolve_session};
use crate::state::AppState;

const REFRESH_COOKIE_MAX_AGE_DAYS: i64 = 30;

// =============================================================================
// COOKIES
// =============================================================================

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Add both session cookies for `tokens` to `jar`.
pub(crate) fn set_session_cookies(jar: CookieJar, tokens: &SessionTokens, secure: bool) -> CookieJar {
    let mut access = session_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure);
    if let Some(secs) = tokens.expires_in.and_then(|s| i64::try_from(s).ok()) {
        access.set_max_age(Duration::seconds(secs));
    }
    let mut refresh = session_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), secure);
    refresh.set_max_age(Duration::days(REFRESH_COOKIE_MAX_AGE_DAYS));
    jar.add(access).add(refresh)
}

/// Expire both session cookies.
pub(crate) fn clear_session_cookies(jar: CookieJar, secure: bool) -> CookieJar {
    let expired = |name| {
        let mut cookie = session_cookie(name, String::new(), secure);
        cookie.set_max_age(Duration::ZERO);
        cookie
    };
    jar.add(expired(ACCESS_COOKIE)).add(expired(REFRESH_COOKIE))
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated user resolved from the session cookies.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: SessionUser,
    pub access_token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Resolved once by the `/api` session layer.
        let lookup = match parts.extensions.get::<SessionLookup>() {
            Some(lookup) => lookup.clone(),
            None => {
                let cookies = SessionCookies::from_headers(&parts.headers);
                if cookies.is_empty() {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                let app_state = AppState::from_ref(state);
                resolve_session(app_state.auth.as_ref(), &cookies)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "auth: session lookup failed");
                        StatusCode::UNAUTHORIZED
                    })?
            }
        };

        match (lookup.user, lookup.access_token) {
            (Some(user), Some(access_token)) => Ok(Self { user, access_token }),
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

pub(crate) fn credential_error_response(err: &CredentialError) -> Response {
    error_response(StatusCode::BAD_REQUEST, err.to_string())
}

pub(crate) fn auth_error_to_status(err: &AuthProviderError) -> StatusCode {
    match err {
        AuthProviderError::Unauthorized => StatusCode::UNAUTHORIZED,
        AuthProviderError::Rejected { .. } => StatusCode::BAD_REQUEST,
        AuthProviderError::Request(_)
        | AuthProviderError::Response { .. }
        | AuthProviderError::Parse(_)
        | AuthProviderError::HttpClientBuild(_) => StatusCode::BAD_GATEWAY,
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

/// `POST /api/auth/login` — password sign-in, sets session cookies.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> Response {
    let email = match credentials::validate_login(&body.email, &body.password) {
        Ok(email) => email,
        Err(e) => return credential_error_response(&e),
    };

    match state.auth.sign_in_with_password(&email, &body.password).await {
        Ok(grant) => {
            info!(user_id = %grant.user.id, "auth: signed in");
            let jar = set_session_cookies(CookieJar::new(), &grant.tokens, state.config.cookie_secure);
            (jar, Json(json!({ "user": grant.user }))).into_response()
        }
        Err(AuthProviderError::Rejected { message, .. }) => error_response(StatusCode::UNAUTHORIZED, message),
        Err(e) => {
            warn!(error = %e, "auth: sign-in failed");
            let status = auth_error_to_status(&e);
            error_response(status, "An error occurred")
        }
    }
}

#[derive(Deserialize)]
pub struct SignUpRequest {
    email: String,
    password: String,
    #[serde(alias = "confirmPassword")]
    confirm_password: String,
}

/// `POST /api/auth/sign-up` — register; sets cookies when the provider
/// confirms immediately.
pub async fn sign_up(State(state): State<AppState>, Json(body): Json<SignUpRequest>) -> Response {
    let email = match credentials::validate_sign_up(&body.email, &body.password, &body.confirm_password) {
        Ok(email) => email,
        Err(e) => return credential_error_response(&e),
    };

    let redirect_to = state.config.sign_up_redirect_url.as_str();
    match state.auth.sign_up(&email, &body.password, Some(redirect_to)).await {
        Ok(SignUpOutcome::Confirmed(grant)) => {
            info!(user_id = %grant.user.id, "auth: signed up (confirmed)");
            let jar = set_session_cookies(CookieJar::new(), &grant.tokens, state.config.cookie_secure);
            let body = json!({ "status": "confirmed", "redirect": SIGN_UP_SUCCESS_PATH, "user": grant.user });
            (jar, Json(body)).into_response()
        }
        Ok(SignUpOutcome::PendingConfirmation { user }) => {
            info!(user_id = %user.id, "auth: signed up (pending confirmation)");
            Json(json!({ "status": "pending", "redirect": SIGN_UP_SUCCESS_PATH, "user": user })).into_response()
        }
        Err(AuthProviderError::Rejected { message, .. }) => {
            error_response(StatusCode::BAD_REQUEST, credentials::sign_up_failure_message(&message))
        }
        Err(e) => {
            warn!(error = %e, "auth: sign-up failed");
            let status = auth_error_to_status(&e);
            error_response(status, "An error occurred")
        }
    }
}

/// `POST /api/auth/logout` — revoke the session (best effort), clear cookies.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let cookies = SessionCookies::from_jar(&jar);
    if let Some(access_token) = cookies.access_token.as_deref() {
        if let Err(e) = state.auth.sign_out(access_token).await {
            warn!(error = %e, "auth: provider sign-out failed");
        }
    }

    (clear_session_cookies(jar, state.config.cookie_secure), StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me` — return current user.
pub async fn me(auth: AuthUser) -> Json<SessionUser> {
    Json(auth.user)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
