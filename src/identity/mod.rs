//! Identity — client for the external auth service.
//!
//! DESIGN
//! ======
//! Credentials are never checked locally. Everything that issues or validates
//! a session goes through the [`AuthProvider`] trait, whose production
//! implementation is [`gotrue::GoTrueClient`].

pub mod gotrue;
pub mod types;

pub use types::{AuthGrant, AuthProvider, AuthProviderError, SessionTokens, SessionUser, SignUpOutcome};
