//! Session resolution from request cookies.
//!
//! ARCHITECTURE
//! ============
//! The browser carries two HttpOnly cookies: a short-lived access token and a
//! long-lived refresh token. Resolution validates the access token with the
//! auth provider and, when that token is missing or expired, trades the
//! refresh token for a new pair. A refreshed pair is handed back to the
//! caller so it can be written onto the outgoing response.
//!
//! TRADE-OFFS
//! ==========
//! Rejected tokens resolve to an anonymous lookup marked stale rather than
//! an error, so callers can drop the dead cookies. Only transport or
//! upstream failures surface as `Err`, leaving the fallback policy to the
//! caller.

use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;

use crate::identity::{AuthProvider, AuthProviderError, SessionTokens, SessionUser};

pub const ACCESS_COOKIE: &str = "session_token";
pub const REFRESH_COOKIE: &str = "refresh_token";

/// Raw session cookies presented by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionCookies {
    #[must_use]
    pub fn from_jar(jar: &CookieJar) -> Self {
        let read = |name: &str| {
            jar.get(name)
                .map(|c| c.value().to_owned())
                .filter(|v| !v.is_empty())
        };
        Self { access_token: read(ACCESS_COOKIE), refresh_token: read(REFRESH_COOKIE) }
    }

    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::from_jar(&CookieJar::from_headers(headers))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Outcome of resolving a request's session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionLookup {
    pub user: Option<SessionUser>,
    /// Access token valid for this request (original or refreshed).
    pub access_token: Option<String>,
    /// New token pair to persist, when the provider refreshed the session.
    pub refreshed: Option<SessionTokens>,
    /// Cookies were presented but the provider rejected them; they should be cleared.
    pub stale: bool,
}

impl SessionLookup {
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stale() -> Self {
        Self { stale: true, ..Self::default() }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Resolve the identity behind `cookies`.
///
/// # Errors
///
/// Returns the provider error when the provider could not be reached or
/// answered unexpectedly. Rejected tokens are not errors; they yield a
/// [`SessionLookup::stale`] lookup.
pub async fn resolve_session(
    provider: &dyn AuthProvider,
    cookies: &SessionCookies,
) -> Result<SessionLookup, AuthProviderError> {
    if cookies.is_empty() {
        return Ok(SessionLookup::anonymous());
    }

    if let Some(access_token) = cookies.access_token.as_deref() {
        match provider.get_user(access_token).await {
            Ok(user) => {
                return Ok(SessionLookup {
                    user: Some(user),
                    access_token: Some(access_token.to_owned()),
                    ..SessionLookup::default()
                });
            }
            Err(e) if e.is_unavailable() => return Err(e),
            Err(_) => {}
        }
    }

    let Some(refresh_token) = cookies.refresh_token.as_deref() else {
        return Ok(SessionLookup::stale());
    };

    match provider.refresh(refresh_token).await {
        Ok(grant) => {
            tracing::debug!(user_id = %grant.user.id, "session refreshed");
            Ok(SessionLookup {
                user: Some(grant.user),
                access_token: Some(grant.tokens.access_token.clone()),
                refreshed: Some(grant.tokens),
                stale: false,
            })
        }
        Err(e) if e.is_unavailable() => Err(e),
        Err(_) => Ok(SessionLookup::stale()),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
