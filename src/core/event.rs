use std::time::Duration;

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// No activity signal within the inactivity window
    Inactivity,
    /// Absolute session ceiling reached or the refresh token was rejected
    SessionExpired,
    /// The user logged out explicitly
    Manual,
}

impl LogoutReason {
    /// Stable machine-readable reason string surfaced to UI collaborators
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutReason::Inactivity => "inactivity",
            LogoutReason::SessionExpired => "session",
            LogoutReason::Manual => "manual",
        }
    }
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Session lifecycle events delivered to UI collaborators
///
/// Events are informational: dismissing or ignoring them never changes
/// timer state. The warning in particular does not cancel the pending
/// logout by itself.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A session was established by login or startup reconciliation
    SessionStarted {
        session_id: String,
        username: String,
    },
    /// Inactivity logout is imminent unless activity is reported
    InactivityWarning { remaining: Duration },
    /// Silent token refresh succeeded and stored tokens were replaced
    TokensRefreshed,
    /// The session ended and local state was cleared
    LoggedOut { reason: LogoutReason },
}

impl std::fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionEvent::SessionStarted { username, .. } => {
                write!(f, "Session started for '{}'", username)
            }
            SessionEvent::InactivityWarning { remaining } => {
                write!(f, "Inactivity logout in {}s", remaining.as_secs())
            }
            SessionEvent::TokensRefreshed => write!(f, "Tokens refreshed"),
            SessionEvent::LoggedOut { reason } => write!(f, "Logged out: {}", reason),
        }
    }
}
