//! Application configuration parsed from environment variables.
//!
//! `main` loads `.env` through `dotenvy` first, so every value here may come
//! from the process environment or that file. Parsing goes through a lookup
//! closure so tests can feed a plain map instead of mutating process state.

use std::path::PathBuf;

use crate::guard::exclusion::ExclusionMatcher;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_STATIC_DIR: &str = "site";
pub const DEFAULT_HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const SIGN_UP_SUCCESS_PATH: &str = "/auth/sign-up-success";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_HTTP_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_HTTP_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthProviderConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionsConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub public_url: String,
    pub sign_up_redirect_url: String,
    pub auth: AuthProviderConfig,
    pub backend_url: String,
    pub documents_url: Option<String>,
    pub completions: Option<CompletionsConfig>,
    pub cookie_secure: bool,
    pub static_dir: PathBuf,
    pub exclusions: ExclusionMatcher,
    pub timeouts: HttpTimeouts,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `AUTH_URL`, `AUTH_ANON_KEY`
    ///
    /// Optional:
    /// - `PORT` (3000), `PUBLIC_URL`, `SIGNUP_REDIRECT_URL`
    /// - `BACKEND_URL` (`http://localhost:8000`), `DOCUMENTS_API_URL`
    /// - `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`
    /// - `COOKIE_SECURE` (inferred from the `PUBLIC_URL` scheme)
    /// - `STATIC_DIR` (`site`), `GUARD_EXCLUDE_PREFIXES`
    /// - `HTTP_REQUEST_TIMEOUT_SECS` (60), `HTTP_CONNECT_TIMEOUT_SECS` (10)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            None => DEFAULT_PORT,
        };

        let public_url = get("PUBLIC_URL")
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_owned();
        let sign_up_redirect_url =
            get("SIGNUP_REDIRECT_URL").unwrap_or_else(|| format!("{public_url}{SIGN_UP_SUCCESS_PATH}"));

        let auth = AuthProviderConfig {
            url: trimmed_url(get("AUTH_URL").ok_or(ConfigError::Missing("AUTH_URL"))?),
            anon_key: get("AUTH_ANON_KEY").ok_or(ConfigError::Missing("AUTH_ANON_KEY"))?,
        };

        let backend_url = trimmed_url(get("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_owned()));
        let documents_url = get("DOCUMENTS_API_URL").map(trimmed_url);
        let completions = get("OPENAI_API_KEY").map(|api_key| CompletionsConfig {
            api_key,
            base_url: trimmed_url(get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_owned())),
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_owned()),
        });

        let cookie_secure = match get("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid { key: "COOKIE_SECURE", value: raw })?,
            None => public_url.starts_with("https://"),
        };

        let static_dir = PathBuf::from(get("STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_owned()));
        let exclusions = get("GUARD_EXCLUDE_PREFIXES").map_or_else(ExclusionMatcher::default, |raw| ExclusionMatcher::parse(&raw));

        let timeouts = HttpTimeouts {
            request_secs: parse_or("HTTP_REQUEST_TIMEOUT_SECS", get("HTTP_REQUEST_TIMEOUT_SECS"), DEFAULT_HTTP_REQUEST_TIMEOUT_SECS)?,
            connect_secs: parse_or("HTTP_CONNECT_TIMEOUT_SECS", get("HTTP_CONNECT_TIMEOUT_SECS"), DEFAULT_HTTP_CONNECT_TIMEOUT_SECS)?,
        };

        Ok(Self {
            port,
            public_url,
            sign_up_redirect_url,
            auth,
            backend_url,
            documents_url,
            completions,
            cookie_secure,
            static_dir,
            exclusions,
            timeouts,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a numeric env var, falling back to `default` when unset or unparsable.
pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_or(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn trimmed_url(raw: String) -> String {
    raw.trim_end_matches('/').to_owned()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
