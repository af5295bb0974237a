mod common;

use common::{drain_events, logouts, new_manager, settle, test_credentials, test_user};
use sessionguard::{
    LogoutReason, SessionConfig, SessionGuardError, SessionPhase, TokenStore, ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
};
use std::sync::atomic::Ordering;
use std::time::Duration;

#[test]
fn test_error_display() {
    let error = SessionGuardError::Auth {
        message: "invalid credentials".to_string(),
    };
    assert!(error.to_string().contains("Authentication error"));
    assert!(error.to_string().contains("invalid credentials"));

    let error = SessionGuardError::Config {
        message: "bad timeout".to_string(),
    };
    assert!(error.to_string().contains("Configuration error"));

    assert!(SessionGuardError::Timeout
        .to_string()
        .contains("timed out"));
}

#[tokio::test]
async fn test_login_failure_leaves_clean_state() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    api.fail_login.store(true, Ordering::SeqCst);

    let result = manager.login(&test_credentials()).await;
    assert!(matches!(result, Err(SessionGuardError::Auth { .. })));

    let snapshot = manager.snapshot().await;
    assert_eq!(snapshot.phase, SessionPhase::NoSession);
    assert!(!snapshot.loading);
    assert_eq!(manager.scheduled_timer_count().await, 0);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_check_auth_recovers_via_refresh_retry() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "stored-refresh").await.unwrap();
    api.user_failures_remaining.store(1, Ordering::SeqCst);

    let user = manager.check_auth().await.unwrap();
    assert_eq!(user, Some(test_user()));

    // One failed fetch, one refresh, one successful retry
    assert_eq!(api.user_calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).await.unwrap(),
        Some("access-2".to_string())
    );
    assert_eq!(manager.snapshot().await.phase, SessionPhase::Active);
}

#[tokio::test]
async fn test_check_auth_gives_up_after_second_failure() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "stored-refresh").await.unwrap();
    api.user_failures_remaining.store(2, Ordering::SeqCst);

    let mut rx = manager.subscribe();
    let user = manager.check_auth().await.unwrap();
    assert!(user.is_none());

    // Retried once, not indefinitely; tokens cleared, no warning surfaced
    assert_eq!(api.user_calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(manager.snapshot().await.phase, SessionPhase::NoSession);
    assert!(!manager.is_loading().await);
    assert!(drain_events(&mut rx).is_empty());
}

#[tokio::test]
async fn test_check_auth_fails_when_refresh_is_rejected() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "expired-refresh").await.unwrap();
    api.user_failures_remaining.store(1, Ordering::SeqCst);
    api.fail_refresh.store(true, Ordering::SeqCst);

    let user = manager.check_auth().await.unwrap();
    assert!(user.is_none());
    assert_eq!(api.user_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test(start_paused = true)]
async fn test_check_auth_user_fetch_is_bounded() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    store.set(ACCESS_TOKEN_KEY, "stale-access").await.unwrap();
    store.set(REFRESH_TOKEN_KEY, "stored-refresh").await.unwrap();
    api.hang_user.store(true, Ordering::SeqCst);
    api.fail_refresh.store(true, Ordering::SeqCst);

    // The hanging fetch is cut off by the auth-check timeout rather than
    // stalling startup forever
    let user = manager.check_auth().await.unwrap();
    assert!(user.is_none());
    assert_eq!(manager.snapshot().await.phase, SessionPhase::NoSession);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_manual_logout_survives_remote_failure() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    api.fail_logout.store(true, Ordering::SeqCst);

    manager.login(&test_credentials()).await.unwrap();
    manager.logout().await.unwrap();

    // Local truth is not held hostage by server reachability
    assert_eq!(manager.snapshot().await.phase, SessionPhase::NoSession);
    assert_eq!(manager.scheduled_timer_count().await, 0);
    assert_eq!(store.get(ACCESS_TOKEN_KEY).await.unwrap(), None);
    assert_eq!(api.logout_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_auto_logout_survives_remote_failure() {
    let (manager, api, store) = new_manager(SessionConfig::default());
    api.fail_logout.store(true, Ordering::SeqCst);
    let mut rx = manager.subscribe();

    manager.login(&test_credentials()).await.unwrap();
    drain_events(&mut rx);
    settle().await;

    tokio::time::advance(Duration::from_secs(30 * 60 + 1)).await;
    settle().await;

    assert_eq!(
        logouts(&drain_events(&mut rx)),
        vec![LogoutReason::Inactivity]
    );
    assert_eq!(manager.snapshot().await.phase, SessionPhase::NoSession);
    assert!(!manager.is_auto_logging_out());
    assert_eq!(store.get(REFRESH_TOKEN_KEY).await.unwrap(), None);
}
