use thiserror::Error;

/// SessionGuard unified error type
#[derive(Error, Debug)]
pub enum SessionGuardError {
    #[error("Authentication error: {message}")]
    Auth { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Session error: {message}")]
    Session { message: String },

    #[error("Authentication check timed out")]
    Timeout,

    #[error("Not authenticated")]
    NotAuthenticated,
}

pub type SessionGuardResult<T> = Result<T, SessionGuardError>;
