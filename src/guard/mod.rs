//! Session-gated route guard.
//!
//! DESIGN
//! ======
//! The guard is an ordered list of [`RouteRule`]s evaluated first-match-wins.
//! Each rule pairs a predicate (which session state it applies to, which path
//! prefixes it covers, which substrings exempt a path) with an action (the
//! redirect target). No rule matching means the request continues.
//!
//! The decision is a pure function of `(path, authenticated)`. Resolving the
//! session and turning a decision into an HTTP response happen in
//! [`middleware`]; which paths reach the guard at all is decided by
//! [`exclusion`].

pub mod exclusion;
pub mod middleware;

pub const LOGIN_PATH: &str = "/auth/login";
pub const CHAT_PATH: &str = "/chat";
pub const SIGN_UP_SUCCESS_MARKER: &str = "sign-up-success";

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    Continue,
    RedirectTo(String),
}

/// Which session state a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Anonymous,
    Authenticated,
}

impl Audience {
    fn admits(self, authenticated: bool) -> bool {
        match self {
            Self::Anonymous => !authenticated,
            Self::Authenticated => authenticated,
        }
    }
}

/// One `(predicate, action)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    audience: Audience,
    prefixes: Vec<String>,
    exempt_substrings: Vec<String>,
    redirect_to: String,
}

impl RouteRule {
    /// Rule redirecting `audience` requests under any of `prefixes` to `redirect_to`.
    #[must_use]
    pub fn redirect<I, S>(audience: Audience, prefixes: I, redirect_to: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            audience,
            prefixes: prefixes.into_iter().map(Into::into).collect(),
            exempt_substrings: Vec::new(),
            redirect_to: redirect_to.into(),
        }
    }

    /// Paths containing `needle` anywhere are left alone by this rule.
    #[must_use]
    pub fn exempt(mut self, needle: impl Into<String>) -> Self {
        self.exempt_substrings.push(needle.into());
        self
    }

    #[must_use]
    pub fn matches(&self, path: &str, authenticated: bool) -> bool {
        self.audience.admits(authenticated)
            && self.prefixes.iter().any(|p| path.starts_with(p.as_str()))
            && !self
                .exempt_substrings
                .iter()
                .any(|needle| path.contains(needle.as_str()))
    }
}

/// Ordered rule list. The first matching rule decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteGuard {
    rules: Vec<RouteRule>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    /// Protected pages send anonymous users to login; auth pages send signed-in
    /// users to chat, except the post-signup confirmation page.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            RouteRule::redirect(Audience::Anonymous, ["/chat", "/protected"], LOGIN_PATH),
            RouteRule::redirect(Audience::Authenticated, ["/auth/"], CHAT_PATH).exempt(SIGN_UP_SUCCESS_MARKER),
        ])
    }

    #[must_use]
    pub fn decide(&self, path: &str, authenticated: bool) -> RoutingDecision {
        self.rules
            .iter()
            .find(|rule| rule.matches(path, authenticated))
            .map_or(RoutingDecision::Continue, |rule| {
                RoutingDecision::RedirectTo(rule.redirect_to.clone())
            })
    }
}

impl Default for RouteGuard {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
