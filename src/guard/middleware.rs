//! Guard middleware — applies the routing guard to every non-excluded request.
//!
//! Excluded paths skip session resolution entirely. For everything else the
//! session is resolved from cookies, the guard decides, and any refreshed
//! token pair rides back on whichever response is returned. Cookies the
//! provider rejected are expired on the same response.
//!
//! `/api` is excluded from the guard and gets [`api_session`] instead: the
//! session is resolved once, handed to the `AuthUser` extractor through the
//! request extensions, and persisted the same way.

use axum::extract::{Request, State};
use axum::http::header::SET_COOKIE;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, warn};

use super::RoutingDecision;
use crate::identity::AuthProviderError;
use crate::routes::auth::{clear_session_cookies, set_session_cookies};
use crate::services::session::{ACCESS_COOKIE, SessionCookies, SessionLookup, resolve_session};
use crate::state::AppState;

/// `axum::middleware::from_fn_with_state` entry point.
pub async fn route_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    if state.config.exclusions.is_excluded(&path) {
        return next.run(request).await;
    }

    let cookies = SessionCookies::from_headers(request.headers());
    let lookup = lookup_or_anonymous(&state, &cookies, &path).await;

    let response = match state.guard.decide(&path, lookup.is_authenticated()) {
        RoutingDecision::RedirectTo(target) => {
            debug!(%path, %target, "guard: redirect");
            Redirect::temporary(&target).into_response()
        }
        RoutingDecision::Continue => next.run(request).await,
    };

    persist_session(&lookup, response, state.config.cookie_secure)
}

/// Session layer for the JSON API.
pub async fn api_session(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let cookies = SessionCookies::from_headers(request.headers());
    if cookies.is_empty() {
        return next.run(request).await;
    }

    let path = request.uri().path().to_owned();
    let lookup = lookup_or_anonymous(&state, &cookies, &path).await;
    request.extensions_mut().insert(lookup.clone());

    let response = next.run(request).await;
    persist_session(&lookup, response, state.config.cookie_secure)
}

async fn lookup_or_anonymous(state: &AppState, cookies: &SessionCookies, path: &str) -> SessionLookup {
    match resolve_session(state.auth.as_ref(), cookies).await {
        Ok(lookup) => lookup,
        Err(e) => {
            log_lookup_failure(path, &e);
            SessionLookup::anonymous()
        }
    }
}

fn log_lookup_failure(path: &str, err: &AuthProviderError) {
    if err.is_unavailable() {
        warn!(%path, error = %err, "session: auth provider unavailable; treating as anonymous");
    } else {
        warn!(%path, error = %err, "session: lookup failed; treating as anonymous");
    }
}

/// Write refreshed tokens, or expire rejected cookies, unless the handler
/// already set the session itself (login, sign-up, logout).
fn persist_session(lookup: &SessionLookup, response: Response, secure: bool) -> Response {
    if sets_session_cookie(&response) {
        return response;
    }
    let jar = if let Some(tokens) = &lookup.refreshed {
        set_session_cookies(CookieJar::new(), tokens, secure)
    } else if lookup.stale {
        debug!("session: clearing rejected cookies");
        clear_session_cookies(CookieJar::new(), secure)
    } else {
        return response;
    };
    (jar, response).into_response()
}

fn sets_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.strip_prefix(ACCESS_COOKIE).is_some_and(|rest| rest.starts_with('=')))
}

#[cfg(test)]
#[path = "middleware_test.rs"]
mod tests;
