//! GoTrue-compatible auth provider client.
//!
//! Speaks the REST dialect used by hosted auth services: password grants and
//! refresh grants on `/auth/v1/token`, sign-up on `/auth/v1/signup`, token
//! introspection on `/auth/v1/user`. Every call carries the project's public
//! `apikey` header.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{Value, json};

use super::{AuthGrant, AuthProvider, AuthProviderError, SessionTokens, SessionUser, SignUpOutcome};
use crate::config::HttpTimeouts;

const DEFAULT_LOGIN_FAILURE: &str = "Invalid login credentials";
const DEFAULT_SIGN_UP_FAILURE: &str = "Sign up failed";

pub struct GoTrueClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl GoTrueClient {
    pub fn new(base_url: &str, anon_key: String, timeouts: HttpTimeouts) -> Result<Self, AuthProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| AuthProviderError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: base_url.trim_end_matches('/').to_owned(), anon_key })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    async fn read(response: reqwest::Response) -> Result<(u16, String), AuthProviderError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;
        Ok((status, body))
    }

    async fn token_grant(&self, grant_type: &str, body: &Value) -> Result<(u16, String), AuthProviderError> {
        let response = self
            .http
            .post(self.url("/token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;
        Self::read(response).await
    }
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthGrant, AuthProviderError> {
        let (status, body) = self
            .token_grant("password", &json!({ "email": email, "password": password }))
            .await?;
        match status {
            200 => parse_grant(&body),
            400 | 401 | 422 => Err(AuthProviderError::Rejected {
                status,
                message: provider_message(&body).unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_owned()),
            }),
            _ => Err(AuthProviderError::Response { status, body }),
        }
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        redirect_to: Option<&str>,
    ) -> Result<SignUpOutcome, AuthProviderError> {
        let mut request = self
            .http
            .post(self.url("/signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }));
        if let Some(redirect_to) = redirect_to {
            request = request.query(&[("redirect_to", redirect_to)]);
        }
        let response = request
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;
        let (status, body) = Self::read(response).await?;
        match status {
            200 | 201 => parse_sign_up(&body),
            400 | 409 | 422 | 429 => Err(AuthProviderError::Rejected {
                status,
                message: provider_message(&body).unwrap_or_else(|| DEFAULT_SIGN_UP_FAILURE.to_owned()),
            }),
            _ => Err(AuthProviderError::Response { status, body }),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<SessionUser, AuthProviderError> {
        let response = self
            .http
            .get(self.url("/user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;
        let (status, body) = Self::read(response).await?;
        match status {
            200 => serde_json::from_str(&body).map_err(|e| AuthProviderError::Parse(e.to_string())),
            401 | 403 => Err(AuthProviderError::Unauthorized),
            _ => Err(AuthProviderError::Response { status, body }),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthGrant, AuthProviderError> {
        let (status, body) = self
            .token_grant("refresh_token", &json!({ "refresh_token": refresh_token }))
            .await?;
        match status {
            200 => parse_grant(&body),
            400 | 401 | 403 => Err(AuthProviderError::Unauthorized),
            _ => Err(AuthProviderError::Response { status, body }),
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthProviderError> {
        let response = self
            .http
            .post(self.url("/logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthProviderError::Request(e.to_string()))?;
        let (status, body) = Self::read(response).await?;
        match status {
            200..=299 => Ok(()),
            401 | 403 => Err(AuthProviderError::Unauthorized),
            _ => Err(AuthProviderError::Response { status, body }),
        }
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    user: SessionUser,
}

impl From<TokenResponse> for AuthGrant {
    fn from(r: TokenResponse) -> Self {
        Self {
            tokens: SessionTokens {
                access_token: r.access_token,
                refresh_token: r.refresh_token,
                expires_in: r.expires_in,
            },
            user: r.user,
        }
    }
}

pub(crate) fn parse_grant(body: &str) -> Result<AuthGrant, AuthProviderError> {
    serde_json::from_str::<TokenResponse>(body)
        .map(AuthGrant::from)
        .map_err(|e| AuthProviderError::Parse(e.to_string()))
}

/// Sign-up answers with a session when auto-confirm is on, otherwise with the
/// bare user (older deployments) or `{ user, session: null }`.
pub(crate) fn parse_sign_up(body: &str) -> Result<SignUpOutcome, AuthProviderError> {
    let value: Value = serde_json::from_str(body).map_err(|e| AuthProviderError::Parse(e.to_string()))?;

    if value.get("access_token").is_some_and(|v| !v.is_null()) {
        let grant = serde_json::from_value::<TokenResponse>(value).map_err(|e| AuthProviderError::Parse(e.to_string()))?;
        return Ok(SignUpOutcome::Confirmed(grant.into()));
    }

    let user_value = if value.get("user").is_some_and(Value::is_object) {
        value["user"].clone()
    } else {
        value
    };
    let user = serde_json::from_value(user_value).map_err(|e| AuthProviderError::Parse(e.to_string()))?;
    Ok(SignUpOutcome::PendingConfirmation { user })
}

/// Pull a human-readable message out of a provider error body.
pub(crate) fn provider_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|msg| !msg.trim().is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "gotrue_test.rs"]
mod tests;
