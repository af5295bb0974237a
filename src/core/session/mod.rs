pub mod manager;
pub mod state;

pub use manager::SessionManager;
pub use state::{SessionPhase, SessionSnapshot};
