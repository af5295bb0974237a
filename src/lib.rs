//! SessionGuard Library
//!
//! Client-side session lifecycle management: activity-driven inactivity
//! auto-logout with a dismissible warning, an absolute session ceiling,
//! and silent token refresh against a pluggable authentication backend.

pub mod core;
pub mod domain;
pub mod infrastructure;

pub use core::event::{LogoutReason, SessionEvent};
pub use core::session::{SessionManager, SessionPhase, SessionSnapshot};
pub use domain::config::{
    SessionConfig, SessionGuardConfig, INACTIVITY_TIMEOUT, REFRESH_INTERVAL, SESSION_TIMEOUT,
    WARNING_LEAD,
};
pub use domain::error::{SessionGuardError, SessionGuardResult};
pub use infrastructure::api::{AuthApi, AuthSession, Credentials, RefreshedTokens, UserProfile};
pub use infrastructure::storage::{
    FileTokenStore, MemoryTokenStore, TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
