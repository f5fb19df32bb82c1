//! Error types
//!
//! Defines domain-specific error types for each layer of the control-connection engine.

use std::fmt;
use std::io;

/// Command tokenizer errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The line produced more tokens than a command may carry.
    TooManyTokens(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooManyTokens(n) => {
                write!(f, "Invalid argument: too many tokens ({})", n)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Errors reported by a host backend through the callback contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The host did not provide this callback.
    NotImplemented,
    InvalidParameter(String),
    UserNotFound(String),
    AccessDenied(String),
    NotFound(String),
    NotADirectory(String),
    PathTraversal(String),
    Io(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::NotImplemented => write!(f, "Callback not implemented"),
            BackendError::InvalidParameter(s) => write!(f, "Invalid parameter: {}", s),
            BackendError::UserNotFound(u) => write!(f, "User not found: {}", u),
            BackendError::AccessDenied(u) => write!(f, "Access denied for user: {}", u),
            BackendError::NotFound(p) => write!(f, "Not found: {}", p),
            BackendError::NotADirectory(p) => write!(f, "Not a directory: {}", p),
            BackendError::PathTraversal(p) => write!(f, "Path traversal attempt: {}", p),
            BackendError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<io::Error> for BackendError {
    fn from(error: io::Error) -> Self {
        BackendError::Io(error.to_string())
    }
}

/// Outcome classes of a failed command handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Wrong argument count or a misuse of the command sequence.
    InvalidParameter,
    /// The command, or the backend callback behind it, is not available.
    NotImplemented,
    /// Any other failure. The handler sent no reply of its own.
    Failed(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::InvalidParameter => write!(f, "Invalid parameter"),
            CommandError::NotImplemented => write!(f, "Not implemented"),
            CommandError::Failed(reason) => write!(f, "Command failed: {}", reason),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<BackendError> for CommandError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NotImplemented => CommandError::NotImplemented,
            BackendError::InvalidParameter(_) => CommandError::InvalidParameter,
            other => CommandError::Failed(other.to_string()),
        }
    }
}

/// General server error that encompasses the fatal error types
#[derive(Debug)]
pub enum FtpServerError {
    Io(io::Error),
    Config(config::ConfigError),
    Bind(String, io::Error),
}

impl fmt::Display for FtpServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FtpServerError::Io(e) => write!(f, "I/O error: {}", e),
            FtpServerError::Config(e) => write!(f, "Configuration error: {}", e),
            FtpServerError::Bind(addr, e) => write!(f, "Failed to bind to {}: {}", addr, e),
        }
    }
}

impl std::error::Error for FtpServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FtpServerError::Io(e) => Some(e),
            FtpServerError::Config(e) => Some(e),
            FtpServerError::Bind(_, e) => Some(e),
        }
    }
}

impl From<io::Error> for FtpServerError {
    fn from(error: io::Error) -> Self {
        FtpServerError::Io(error)
    }
}

impl From<config::ConfigError> for FtpServerError {
    fn from(error: config::ConfigError) -> Self {
        FtpServerError::Config(error)
    }
}
