//! Backend callback contract
//!
//! The host application plugs its identity checks and directory handling into
//! the engine by implementing [`FtpBackend`]. Every callback is optional: the
//! default body reports `BackendError::NotImplemented`, which the engine turns
//! into a "command not implemented" reply.

pub mod local;

use crate::client::SessionState;
use crate::error::BackendError;

pub use local::LocalBackend;

pub type BackendResult<T> = Result<T, BackendError>;

/// Per-call data handed to every callback.
pub struct CallbackData<'a> {
    pub state: &'a SessionState,
}

impl<'a> CallbackData<'a> {
    pub fn new(state: &'a SessionState) -> Self {
        Self { state }
    }

    /// Identifier of the calling session; stable for the life of the connection.
    pub fn session_id(&self) -> u64 {
        self.state.session_id()
    }

    /// User name stored by a successful USER, if any.
    pub fn user(&self) -> Option<&str> {
        self.state.user()
    }
}

/// Host-supplied filesystem and authentication callbacks.
///
/// One instance is shared by all sessions, so implementations synchronize
/// their own mutable state.
pub trait FtpBackend: Send + Sync {
    /// Succeeds iff the account exists.
    fn on_user_connect(&self, _data: &CallbackData<'_>, _user: &str) -> BackendResult<()> {
        Err(BackendError::NotImplemented)
    }

    /// Succeeds iff the credentials are valid.
    fn on_user_authenticate(
        &self,
        _data: &CallbackData<'_>,
        _user: &str,
        _password: &str,
    ) -> BackendResult<()> {
        Err(BackendError::NotImplemented)
    }

    /// Notification that the session is closing. The result is ignored.
    fn on_user_disconnect(&self, _data: &CallbackData<'_>) -> BackendResult<()> {
        Err(BackendError::NotImplemented)
    }

    /// Called once when the control connection ends, however it ends.
    /// Does nothing unless overridden.
    fn on_session_end(&self, _data: &CallbackData<'_>) -> BackendResult<()> {
        Ok(())
    }

    fn on_path_get_current(&self, _data: &CallbackData<'_>) -> BackendResult<String> {
        Err(BackendError::NotImplemented)
    }

    fn on_path_set_current(&self, _data: &CallbackData<'_>, _path: &str) -> BackendResult<()> {
        Err(BackendError::NotImplemented)
    }

    fn on_path_up(&self, _data: &CallbackData<'_>) -> BackendResult<()> {
        Err(BackendError::NotImplemented)
    }

    /// Produces a serialized listing of `path`, or of the current directory
    /// when `path` is `None`.
    fn on_list(&self, _data: &CallbackData<'_>, _path: Option<&str>) -> BackendResult<Vec<u8>> {
        Err(BackendError::NotImplemented)
    }
}

/// A backend with no callbacks at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl FtpBackend for NullBackend {}
