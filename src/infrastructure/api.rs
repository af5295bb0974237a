use crate::domain::error::SessionGuardResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Authenticated user profile
///
/// The manager treats the profile as opaque beyond its identifier; any
/// additional backend fields are carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

/// Result of a successful token refresh
///
/// Backends that do not rotate refresh tokens return `None` for
/// `refresh_token`, leaving the stored one in place.
#[derive(Debug, Clone)]
pub struct RefreshedTokens {
    pub token: String,
    pub refresh_token: Option<String>,
}

/// Remote authentication API consumed by the session manager
///
/// All calls are best-effort remote operations; the manager never
/// interprets token contents, only success or failure.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Authenticate and obtain a fresh token pair
    async fn login(&self, credentials: &Credentials) -> SessionGuardResult<AuthSession>;

    /// Invalidate the session server-side
    async fn logout(&self) -> SessionGuardResult<()>;

    /// Fetch the profile associated with the stored access token
    async fn current_user(&self) -> SessionGuardResult<UserProfile>;

    /// Exchange the refresh token for a new token pair
    async fn refresh_token(&self, refresh_token: &str) -> SessionGuardResult<RefreshedTokens>;
}
