//! Configuration management for the FTP control-connection engine
//!
//! Loads `config.toml` with `FTPCTL_*` environment overrides. Every field has
//! a default, so an embedding host can also start from
//! `ServerConfig::default()` without any file.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::protocol::parser::MAX_TOKENS;

const CONFIG_PATHS: [&str; 2] = [
    "ftpctl-engine/config", // Installed layout: ./ftpctl-engine/config.toml
    "config",               // Local development: ./config.toml
];

/// Shortest line limit that still fits `MAX_TOKENS + 1` one-byte tokens and
/// CRLF, so an over-long token list is reported as such.
pub const MIN_COMMAND_LENGTH: usize = 2 * MAX_TOKENS + 3;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    // ═══ NETWORK (Environment Override Supported) ═══
    /// IP address to bind the FTP control connection
    pub bind_address: String,

    /// Port for the FTP control connection
    pub control_port: u16,

    /// Maximum concurrent sessions
    pub max_clients: usize,

    // ═══ PROTOCOL BEHAVIOR ═══
    /// Longest accepted command line in bytes, terminator included
    pub max_command_length: usize,

    /// Failed USER/PASS attempts before the session is dropped
    pub max_failed_logins: u32,

    /// Reject directory commands until PASS succeeds
    pub require_auth: bool,

    /// Text sent for SYST instead of the detected OS name
    pub system_name: Option<String>,

    // ═══ REFERENCE BACKEND (TOML Only) ═══
    /// Root directory served by the local backend
    pub server_root: String,

    /// User name to password table for the local backend
    pub users: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            control_port: 2121,
            max_clients: 64,
            max_command_length: 1024,
            max_failed_logins: 3,
            require_auth: false,
            system_name: None,
            server_root: "./server_root".to_string(),
            users: HashMap::new(),
        }
    }
}

/// The part of the configuration the command dispatcher consults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub max_command_length: usize,
    pub max_failed_logins: u32,
    pub require_auth: bool,
    pub system_name: Option<String>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        ServerConfig::default().engine_options()
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut last_error = None;

        for config_path in CONFIG_PATHS {
            match Config::builder()
                .add_source(File::with_name(config_path))
                .add_source(Environment::with_prefix("FTPCTL").try_parsing(true))
                .build()
            {
                Ok(settings) => {
                    let config: ServerConfig = settings.try_deserialize()?;
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    last_error = Some(e);
                }
            }
        }

        Err(config::ConfigError::Message(format!(
            "Failed to load config.toml from any location. Tried: {CONFIG_PATHS:?}. Last error: {last_error:?}"
        )))
    }

    /// Parse configuration from TOML text, without environment overrides
    pub fn from_toml(text: &str) -> Result<Self, config::ConfigError> {
        let config: ServerConfig = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.control_port == 0 {
            return Err(config::ConfigError::Message(
                "Control port cannot be 0".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.max_failed_logins == 0 {
            return Err(config::ConfigError::Message(
                "max_failed_logins must be greater than 0".into(),
            ));
        }

        if self.max_command_length < MIN_COMMAND_LENGTH {
            return Err(config::ConfigError::Message(format!(
                "max_command_length must be at least {}",
                MIN_COMMAND_LENGTH
            )));
        }

        if self.server_root.is_empty() {
            return Err(config::ConfigError::Message(
                "server_root cannot be empty".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    /// Get server root as PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            max_command_length: self.max_command_length,
            max_failed_logins: self.max_failed_logins,
            require_auth: self.require_auth,
            system_name: self.system_name.clone(),
        }
    }
}
