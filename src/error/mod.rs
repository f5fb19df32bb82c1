//! Error handling
//!
//! Defines error types and handling for the FTP control-connection engine.

pub mod handlers;
pub mod types;

pub use handlers::command_error_reply;
pub use types::*;
