#![allow(dead_code)]

use async_trait::async_trait;
use sessionguard::{
    AuthApi, AuthSession, Credentials, MemoryTokenStore, RefreshedTokens, SessionConfig,
    SessionEvent, SessionGuardError, SessionGuardResult, SessionManager, TokenStore, UserProfile,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};

/// Scriptable authentication backend for driving the session manager
#[derive(Default)]
pub struct MockAuthApi {
    pub login_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub fail_login: AtomicBool,
    pub fail_logout: AtomicBool,
    pub fail_refresh: AtomicBool,
    /// Fail this many current-user fetches before succeeding
    pub user_failures_remaining: AtomicUsize,
    /// Make current-user fetches hang forever (bounded-timeout tests)
    pub hang_user: AtomicBool,
    /// Park logout calls until `logout_gate` is notified
    pub gate_logout: AtomicBool,
    pub logout_gate: Notify,
}

pub fn test_user() -> UserProfile {
    UserProfile {
        id: "u1".to_string(),
        username: "alice".to_string(),
        extra: HashMap::new(),
    }
}

pub fn test_credentials() -> Credentials {
    Credentials {
        username: "alice".to_string(),
        password: "secret".to_string(),
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _credentials: &Credentials) -> SessionGuardResult<AuthSession> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_login.load(Ordering::SeqCst) {
            return Err(SessionGuardError::Auth {
                message: "invalid credentials".to_string(),
            });
        }
        Ok(AuthSession {
            token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            user: test_user(),
        })
    }

    async fn logout(&self) -> SessionGuardResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if self.gate_logout.load(Ordering::SeqCst) {
            self.logout_gate.notified().await;
        }
        if self.fail_logout.load(Ordering::SeqCst) {
            return Err(SessionGuardError::Auth {
                message: "logout endpoint unreachable".to_string(),
            });
        }
        Ok(())
    }

    async fn current_user(&self) -> SessionGuardResult<UserProfile> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        if self.hang_user.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let remaining = self.user_failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.user_failures_remaining
                .store(remaining - 1, Ordering::SeqCst);
            return Err(SessionGuardError::Auth {
                message: "stored token rejected".to_string(),
            });
        }
        Ok(test_user())
    }

    async fn refresh_token(&self, _refresh_token: &str) -> SessionGuardResult<RefreshedTokens> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(SessionGuardError::Auth {
                message: "refresh token expired".to_string(),
            });
        }
        Ok(RefreshedTokens {
            token: "access-2".to_string(),
            refresh_token: Some("refresh-2".to_string()),
        })
    }
}

pub fn new_manager(
    config: SessionConfig,
) -> (
    Arc<SessionManager>,
    Arc<MockAuthApi>,
    Arc<MemoryTokenStore>,
) {
    let api = Arc::new(MockAuthApi::default());
    let store = Arc::new(MemoryTokenStore::new());
    let manager = SessionManager::new(
        Arc::clone(&api) as Arc<dyn AuthApi>,
        Arc::clone(&store) as Arc<dyn TokenStore>,
        config,
    )
    .expect("valid test config");
    (manager, api, store)
}

/// Let spawned timer tasks run without letting the paused clock auto-advance
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Drain all pending events without awaiting (awaiting would auto-advance
/// the paused clock)
pub fn drain_events(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    events
}

pub fn warnings(events: &[SessionEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, SessionEvent::InactivityWarning { .. }))
        .count()
}

pub fn logouts(events: &[SessionEvent]) -> Vec<sessionguard::LogoutReason> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::LoggedOut { reason } => Some(*reason),
            _ => None,
        })
        .collect()
}
