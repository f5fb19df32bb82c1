//! FTP control-connection engine
//!
//! Implements the RFC 959 control channel: command tokenizing, a fixed verb
//! table, USER/PASS authentication with lockout, and three-digit replies. The
//! host supplies identity checks and directory handling through
//! [`backend::FtpBackend`].

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use backend::{CallbackData, FtpBackend, LocalBackend};
pub use client::{SessionEnd, SessionState, handle_client};
pub use config::{EngineOptions, ServerConfig};
pub use server::FtpServer;
