//! Client session management
//!
//! Per-connection session state and the command dispatcher that drives it.

pub mod handler;
pub mod state;

pub use handler::{SessionEnd, handle_client};
pub use state::{AuthState, SessionState};
