use crate::infrastructure::api::UserProfile;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No authenticated user; no timers are running
    NoSession,
    /// Authenticated, inside the inactivity window
    Active,
    /// The inactivity warning fired; logout is pending unless activity arrives
    WarningIssued,
    /// Logout is in flight; further triggers are ignored
    LoggingOut,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::NoSession => write!(f, "NoSession"),
            SessionPhase::Active => write!(f, "Active"),
            SessionPhase::WarningIssued => write!(f, "WarningIssued"),
            SessionPhase::LoggingOut => write!(f, "LoggingOut"),
        }
    }
}

/// Read-only view of the session state for UI collaborators
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Current lifecycle phase
    pub phase: SessionPhase,
    /// Authenticated user, if any
    pub user: Option<UserProfile>,
    /// True while login or startup reconciliation is in flight
    pub loading: bool,
    /// True while an automatic logout is executing
    pub auto_logging_out: bool,
}

/// Mutable session internals owned by the manager
#[derive(Debug)]
pub(crate) struct SessionInner {
    pub phase: SessionPhase,
    pub user: Option<UserProfile>,
    pub session_id: Option<String>,
    pub last_activity: Instant,
    pub loading: bool,
}

impl SessionInner {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::NoSession,
            user: None,
            session_id: None,
            last_activity: Instant::now(),
            loading: false,
        }
    }

    /// Reset to the no-session state, preserving the loading flag
    pub fn clear(&mut self) {
        self.phase = SessionPhase::NoSession;
        self.user = None;
        self.session_id = None;
    }

    pub fn has_session(&self) -> bool {
        !matches!(self.phase, SessionPhase::NoSession)
    }
}

/// Time remaining before the inactivity logout for a given idle duration,
/// floored at zero
pub fn remaining_before_logout(idle: Duration, timeout: Duration) -> Duration {
    timeout.saturating_sub(idle)
}
