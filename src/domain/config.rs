use crate::domain::error::{SessionGuardError, SessionGuardResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum idle time before auto-logout, exposed for UI display
pub const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Hard ceiling on session length regardless of activity, exposed for UI display
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// How long before the inactivity logout the warning fires
pub const WARNING_LEAD: Duration = Duration::from_secs(5 * 60);

/// Cadence of silent token-refresh attempts
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(20 * 60);

/// SessionGuard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionGuardConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Session timing configuration
    #[serde(default)]
    pub session: SessionConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Session timing configuration
///
/// All fields default to the documented constants; override via the
/// configuration file only when embedding in non-standard environments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Time of no activity signal before auto-logout, in milliseconds
    #[serde(default = "default_inactivity_timeout_ms")]
    pub inactivity_timeout_ms: u64,
    /// How long before the inactivity logout the warning fires, in milliseconds
    #[serde(default = "default_warning_lead_ms")]
    pub warning_lead_ms: u64,
    /// Hard ceiling on session length regardless of activity, in milliseconds
    #[serde(default = "default_absolute_session_ms")]
    pub absolute_session_ms: u64,
    /// Cadence of silent token-refresh attempts, in milliseconds
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    /// Upper bound on the startup current-user fetch, in milliseconds
    #[serde(default = "default_auth_check_timeout_ms")]
    pub auth_check_timeout_ms: u64,
}

impl SessionConfig {
    /// Validate the timing relationships between the configured options
    pub fn validate(&self) -> SessionGuardResult<()> {
        if self.inactivity_timeout_ms == 0 {
            return Err(SessionGuardError::Config {
                message: "inactivity_timeout_ms must be greater than zero".to_string(),
            });
        }
        if self.warning_lead_ms == 0 || self.warning_lead_ms >= self.inactivity_timeout_ms {
            return Err(SessionGuardError::Config {
                message: format!(
                    "warning_lead_ms ({}) must be non-zero and less than inactivity_timeout_ms ({})",
                    self.warning_lead_ms, self.inactivity_timeout_ms
                ),
            });
        }
        if self.absolute_session_ms < self.inactivity_timeout_ms {
            return Err(SessionGuardError::Config {
                message: format!(
                    "absolute_session_ms ({}) must be at least inactivity_timeout_ms ({})",
                    self.absolute_session_ms, self.inactivity_timeout_ms
                ),
            });
        }
        if self.refresh_interval_ms == 0 {
            return Err(SessionGuardError::Config {
                message: "refresh_interval_ms must be greater than zero".to_string(),
            });
        }
        if self.auth_check_timeout_ms == 0 {
            return Err(SessionGuardError::Config {
                message: "auth_check_timeout_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Time of no activity signal before auto-logout
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    /// How long before the inactivity logout the warning fires
    pub fn warning_lead(&self) -> Duration {
        Duration::from_millis(self.warning_lead_ms)
    }

    /// Hard ceiling on session length regardless of activity
    pub fn absolute_session(&self) -> Duration {
        Duration::from_millis(self.absolute_session_ms)
    }

    /// Cadence of silent token-refresh attempts
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Upper bound on the startup current-user fetch
    pub fn auth_check_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_check_timeout_ms)
    }

    /// Delay from an activity signal to the warning deadline
    pub fn warning_delay(&self) -> Duration {
        self.inactivity_timeout() - self.warning_lead()
    }
}

impl Default for SessionGuardConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_ms: default_inactivity_timeout_ms(),
            warning_lead_ms: default_warning_lead_ms(),
            absolute_session_ms: default_absolute_session_ms(),
            refresh_interval_ms: default_refresh_interval_ms(),
            auth_check_timeout_ms: default_auth_check_timeout_ms(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_inactivity_timeout_ms() -> u64 {
    INACTIVITY_TIMEOUT.as_millis() as u64
}

fn default_warning_lead_ms() -> u64 {
    WARNING_LEAD.as_millis() as u64
}

fn default_absolute_session_ms() -> u64 {
    SESSION_TIMEOUT.as_millis() as u64
}

fn default_refresh_interval_ms() -> u64 {
    REFRESH_INTERVAL.as_millis() as u64
}

fn default_auth_check_timeout_ms() -> u64 {
    5000
}
