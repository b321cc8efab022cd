use super::*;

const WINDOW: Duration = Duration::from_secs(60);

fn limiter(per_user_limit: usize, global_limit: usize) -> RateLimiter {
    RateLimiter::with_config(RateLimitConfig { per_user_limit, global_limit, window: WINDOW })
}

#[test]
fn per_user_allows_up_to_limit() {
    let rl = limiter(3, 100);
    let now = Instant::now();
    for i in 0..3 {
        assert!(rl.check_and_record_at("alice", now).is_ok(), "request {i} should succeed");
    }
    assert!(matches!(
        rl.check_and_record_at("alice", now),
        Err(RateLimitError::PerUserExceeded { limit: 3, window_secs: 60 })
    ));
}

#[test]
fn global_allows_up_to_limit() {
    let rl = limiter(100, 4);
    let now = Instant::now();
    for i in 0..4 {
        assert!(rl.check_and_record_at(&format!("user-{i}"), now).is_ok());
    }
    assert!(matches!(
        rl.check_and_record_at("someone-else", now),
        Err(RateLimitError::GlobalExceeded { limit: 4, .. })
    ));
}

#[test]
fn window_expiry_allows_new_requests() {
    let rl = limiter(2, 100);
    let start = Instant::now();
    rl.check_and_record_at("alice", start).unwrap();
    rl.check_and_record_at("alice", start).unwrap();
    assert!(rl.check_and_record_at("alice", start).is_err());

    let after_window = start + WINDOW + Duration::from_millis(1);
    assert!(rl.check_and_record_at("alice", after_window).is_ok());
}

#[test]
fn distinct_users_do_not_interfere() {
    let rl = limiter(1, 100);
    let now = Instant::now();
    rl.check_and_record_at("alice", now).unwrap();
    assert!(rl.check_and_record_at("alice", now).is_err());
    assert!(rl.check_and_record_at("bob", now).is_ok());
}

#[test]
fn rejected_requests_are_not_recorded() {
    let rl = limiter(1, 2);
    let now = Instant::now();
    rl.check_and_record_at("alice", now).unwrap();
    assert!(rl.check_and_record_at("alice", now).is_err());
    assert!(rl.check_and_record_at("bob", now).is_ok());
}

#[test]
fn clones_share_state() {
    let rl = limiter(1, 100);
    let other = rl.clone();
    let now = Instant::now();
    rl.check_and_record_at("alice", now).unwrap();
    assert!(other.check_and_record_at("alice", now).is_err());
}

#[test]
fn idle_users_are_forgotten() {
    let rl = limiter(5, 100);
    let start = Instant::now();
    rl.check_and_record_at("alice", start).unwrap();
    rl.check_and_record_at("bob", start).unwrap();
    assert_eq!(rl.inner.lock().unwrap().user_requests.len(), 2);

    let after_window = start + WINDOW + Duration::from_millis(1);
    rl.check_and_record_at("carol", after_window).unwrap();
    let inner = rl.inner.lock().unwrap();
    assert_eq!(inner.user_requests.len(), 1);
    assert!(inner.user_requests.contains_key("carol"));
}

#[test]
fn default_config_values() {
    let cfg = RateLimitConfig::default();
    assert_eq!(cfg.per_user_limit, 20);
    assert_eq!(cfg.global_limit, 200);
    assert_eq!(cfg.window, Duration::from_secs(60));
}

#[test]
fn error_messages_mention_limits() {
    let err = RateLimitError::PerUserExceeded { limit: 20, window_secs: 60 };
    assert_eq!(err.to_string(), "per-user rate limit exceeded (max 20 requests/60s)");
}
