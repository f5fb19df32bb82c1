//! Server core functionality
//!
//! The socket-server collaborator: binds the control port, accepts
//! connections and hands each one to the command dispatcher on its own task.

pub mod core;

pub use self::core::{FtpServer, ServerShared, SessionGuard};
