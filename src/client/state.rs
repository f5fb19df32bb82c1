//! Module `state`
//!
//! Defines `SessionState`, the per-connection record of authentication
//! progress and activity for one FTP control connection.

use std::net::SocketAddr;
use std::time::Instant;

/// Where a session stands in the USER/PASS login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    UserNamed,
    Authenticated,
    Locked,
}

/// Represents the state of one connected FTP client.
///
/// Owned exclusively by the task serving that connection.
#[derive(Debug)]
pub struct SessionState {
    session_id: u64,
    user: Option<String>,
    client_addr: Option<SocketAddr>,
    failed_logins: u32,
    logged_in: bool,
    last_command_time: Instant,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session_id: 0,
            user: None,
            client_addr: None,
            failed_logins: 0,
            logged_in: false,
            last_command_time: Instant::now(),
        }
    }
}

impl SessionState {
    pub fn new(session_id: u64, client_addr: Option<SocketAddr>) -> Self {
        Self {
            session_id,
            client_addr,
            ..Self::default()
        }
    }

    /// Resets the session, clearing the stored user name and login flag and
    /// restarting the activity clock.
    ///
    /// The failed-login counter is kept; it covers the whole connection.
    pub fn reset(&mut self) {
        self.user = None;
        self.logged_in = false;
        self.last_command_time = Instant::now();
    }

    /// Login progress given a lockout threshold.
    pub fn auth_state(&self, max_failed_logins: u32) -> AuthState {
        if self.failed_logins >= max_failed_logins {
            AuthState::Locked
        } else if self.logged_in {
            AuthState::Authenticated
        } else if self.user.is_some() {
            AuthState::UserNamed
        } else {
            AuthState::Unauthenticated
        }
    }

    // --------------------
    // Getter methods
    // --------------------

    /// Server-assigned identifier, unique among the sessions of one server.
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn client_addr(&self) -> Option<&SocketAddr> {
        self.client_addr.as_ref()
    }

    pub fn failed_logins(&self) -> u32 {
        self.failed_logins
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn last_command_time(&self) -> Instant {
        self.last_command_time
    }

    // --------------------
    // Setter methods
    // --------------------

    pub fn set_user(&mut self, user: Option<String>) {
        self.user = user;
    }

    pub fn set_logged_in(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    pub fn record_failed_login(&mut self) {
        self.failed_logins = self.failed_logins.saturating_add(1);
    }

    /// Stamps the time of the last accepted command.
    pub fn touch(&mut self) {
        self.last_command_time = Instant::now();
    }
}
