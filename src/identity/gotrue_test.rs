use super::*;

// ===== token grants =====

#[test]
fn parse_grant_reads_tokens_and_user() {
    let body = json!({
        "access_token": "acc",
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "ref",
        "user": { "id": "u-1", "email": "a@example.com", "role": "authenticated" }
    })
    .to_string();
    let grant = parse_grant(&body).unwrap();
    assert_eq!(grant.tokens.access_token, "acc");
    assert_eq!(grant.tokens.refresh_token, "ref");
    assert_eq!(grant.tokens.expires_in, Some(3600));
    assert_eq!(grant.user.id, "u-1");
    assert_eq!(grant.user.email.as_deref(), Some("a@example.com"));
}

#[test]
fn parse_grant_without_expiry() {
    let body = json!({ "access_token": "a", "refresh_token": "r", "user": { "id": "u" } }).to_string();
    let grant = parse_grant(&body).unwrap();
    assert!(grant.tokens.expires_in.is_none());
    assert!(grant.user.email.is_none());
}

#[test]
fn parse_grant_missing_tokens_is_parse_error() {
    let body = json!({ "user": { "id": "u" } }).to_string();
    assert!(matches!(parse_grant(&body), Err(AuthProviderError::Parse(_))));
}

// ===== sign-up =====

#[test]
fn sign_up_with_session_is_confirmed() {
    let body = json!({
        "access_token": "a",
        "refresh_token": "r",
        "user": { "id": "u-2", "email": "b@example.com" }
    })
    .to_string();
    match parse_sign_up(&body).unwrap() {
        SignUpOutcome::Confirmed(grant) => assert_eq!(grant.user.id, "u-2"),
        other => panic!("expected confirmed, got {other:?}"),
    }
}

#[test]
fn sign_up_bare_user_is_pending() {
    let body = json!({ "id": "u-3", "email": "c@example.com", "confirmation_sent_at": "2024-01-01T00:00:00Z" })
        .to_string();
    assert_eq!(
        parse_sign_up(&body).unwrap(),
        SignUpOutcome::PendingConfirmation {
            user: SessionUser { id: "u-3".into(), email: Some("c@example.com".into()) }
        }
    );
}

#[test]
fn sign_up_user_with_null_session_is_pending() {
    let body = json!({ "user": { "id": "u-4" }, "session": null, "access_token": null }).to_string();
    assert!(matches!(
        parse_sign_up(&body).unwrap(),
        SignUpOutcome::PendingConfirmation { user } if user.id == "u-4"
    ));
}

#[test]
fn sign_up_garbage_is_parse_error() {
    assert!(matches!(parse_sign_up("not json"), Err(AuthProviderError::Parse(_))));
}

// ===== error messages =====

#[test]
fn provider_message_prefers_error_description() {
    let body = json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }).to_string();
    assert_eq!(provider_message(&body).as_deref(), Some("Invalid login credentials"));
}

#[test]
fn provider_message_falls_back_through_keys() {
    assert_eq!(provider_message(r#"{"msg":"User already registered"}"#).as_deref(), Some("User already registered"));
    assert_eq!(provider_message(r#"{"message":"rate limited"}"#).as_deref(), Some("rate limited"));
    assert_eq!(provider_message(r#"{"error":"boom"}"#).as_deref(), Some("boom"));
}

#[test]
fn provider_message_ignores_blank_and_non_json() {
    assert!(provider_message(r#"{"msg":"  "}"#).is_none());
    assert!(provider_message("<html>").is_none());
    assert!(provider_message(r#"{"code":400}"#).is_none());
}

// ===== client =====

#[test]
fn client_trims_trailing_slash() {
    let timeouts = HttpTimeouts { request_secs: 5, connect_secs: 1 };
    let client = GoTrueClient::new("https://auth.example.com/", "anon".into(), timeouts).unwrap();
    assert_eq!(client.url("/user"), "https://auth.example.com/auth/v1/user");
}

#[test]
fn unavailable_classification() {
    assert!(AuthProviderError::Request("timeout".into()).is_unavailable());
    assert!(AuthProviderError::Response { status: 500, body: String::new() }.is_unavailable());
    assert!(!AuthProviderError::Unauthorized.is_unavailable());
    assert!(!AuthProviderError::Rejected { status: 400, message: "bad".into() }.is_unavailable());
}
