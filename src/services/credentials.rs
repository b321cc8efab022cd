//! Sign-up / sign-in input checks and provider message shaping.
//!
//! Only cheap shape checks happen here; whether credentials are valid is
//! always the auth provider's call.

pub const MIN_PASSWORD_LEN: usize = 6;
pub const DUPLICATE_EMAIL_MESSAGE: &str =
    "This email is already registered. Please sign in instead or use a different email.";

const DUPLICATE_EMAIL_MARKERS: &[&str] = &["already registered", "already in use", "user already exists"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password is required")]
    MissingPassword,
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Check a login form, returning the normalized email.
pub fn validate_login(email: &str, password: &str) -> Result<String, CredentialError> {
    let email = normalize_email(email).ok_or(CredentialError::InvalidEmail)?;
    if password.is_empty() {
        return Err(CredentialError::MissingPassword);
    }
    Ok(email)
}

/// Check a sign-up form, returning the normalized email.
pub fn validate_sign_up(email: &str, password: &str, confirm_password: &str) -> Result<String, CredentialError> {
    let email = normalize_email(email).ok_or(CredentialError::InvalidEmail)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(CredentialError::PasswordTooShort);
    }
    if password != confirm_password {
        return Err(CredentialError::PasswordMismatch);
    }
    Ok(email)
}

/// Provider sign-up rejections, rewritten for display when they mean
/// "this email is taken".
#[must_use]
pub fn sign_up_failure_message(provider_message: &str) -> String {
    let lower = provider_message.to_lowercase();
    if DUPLICATE_EMAIL_MARKERS.iter().any(|m| lower.contains(m)) {
        DUPLICATE_EMAIL_MESSAGE.to_owned()
    } else {
        provider_message.to_owned()
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
