//! Local directory backend
//!
//! A reference `FtpBackend` serving a directory tree from disk with a static
//! credential table. Each session gets its own virtual working directory
//! starting at `/`, forgotten when the session ends.

use crate::backend::{BackendResult, CallbackData, FtpBackend};
use crate::error::BackendError;
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const MAX_CREDENTIAL_LENGTH: usize = 64;

pub struct LocalBackend {
    root: PathBuf,
    credentials: HashMap<String, String>,
    working_dirs: Mutex<HashMap<u64, String>>,
}

impl LocalBackend {
    pub fn new(root: impl Into<PathBuf>, credentials: HashMap<String, String>) -> Self {
        Self {
            root: root.into(),
            credentials,
            working_dirs: Mutex::new(HashMap::new()),
        }
    }

    fn current_dir(&self, data: &CallbackData<'_>) -> BackendResult<String> {
        let dirs = self.lock_dirs()?;
        Ok(dirs
            .get(&data.session_id())
            .cloned()
            .unwrap_or_else(|| "/".to_string()))
    }

    fn set_current_dir(&self, data: &CallbackData<'_>, path: String) -> BackendResult<()> {
        let mut dirs = self.lock_dirs()?;
        dirs.insert(data.session_id(), path);
        Ok(())
    }

    fn lock_dirs(&self) -> BackendResult<std::sync::MutexGuard<'_, HashMap<u64, String>>> {
        self.working_dirs
            .lock()
            .map_err(|_| BackendError::Io("working directory table poisoned".into()))
    }

    /// Resolves a virtual path and checks it names a directory inside the root.
    fn existing_dir(&self, virtual_path: &str) -> BackendResult<PathBuf> {
        let real_path = virtual_to_real_path(&self.root, virtual_path);

        if !real_path.exists() {
            return Err(BackendError::NotFound(virtual_path.to_string()));
        }
        if !real_path.is_dir() {
            return Err(BackendError::NotADirectory(virtual_path.to_string()));
        }

        // Symlinks may still lead outside the root
        let canonical = real_path.canonicalize()?;
        let root_canonical = self.root.canonicalize()?;
        if !canonical.starts_with(&root_canonical) {
            return Err(BackendError::PathTraversal(virtual_path.to_string()));
        }

        Ok(real_path)
    }
}

/// Performs basic input sanitation on user names and passwords.
fn is_valid_input(input: &str) -> bool {
    !input.trim().is_empty()
        && input.len() <= MAX_CREDENTIAL_LENGTH
        && !input.contains(['\r', '\n', '\0'])
}

/// Resolves `target` against the virtual directory `current`.
///
/// Handles absolute and relative targets and `.`/`..` components. Going above
/// `/` is an error.
pub fn resolve_virtual_path(current: &str, target: &str) -> BackendResult<String> {
    if target.is_empty() {
        return Err(BackendError::InvalidParameter("empty path".into()));
    }

    let mut components: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        current.split('/').filter(|c| !c.is_empty()).collect()
    };

    for component in target.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                if components.pop().is_none() {
                    return Err(BackendError::PathTraversal(target.to_string()));
                }
            }
            name => components.push(name),
        }
    }

    Ok(format!("/{}", components.join("/")))
}

/// Maps a normalized virtual path onto the backend's root directory.
pub fn virtual_to_real_path(root: &Path, virtual_path: &str) -> PathBuf {
    root.join(virtual_path.trim_start_matches('/'))
}

impl FtpBackend for LocalBackend {
    fn on_user_connect(&self, _data: &CallbackData<'_>, user: &str) -> BackendResult<()> {
        if !is_valid_input(user) {
            return Err(BackendError::InvalidParameter("Invalid username format".into()));
        }

        if self.credentials.contains_key(user) {
            Ok(())
        } else {
            Err(BackendError::UserNotFound(user.to_string()))
        }
    }

    fn on_user_authenticate(
        &self,
        _data: &CallbackData<'_>,
        user: &str,
        password: &str,
    ) -> BackendResult<()> {
        if !is_valid_input(password) {
            return Err(BackendError::AccessDenied(user.to_string()));
        }

        match self.credentials.get(user) {
            Some(stored) if stored == password => Ok(()),
            Some(_) => Err(BackendError::AccessDenied(user.to_string())),
            None => Err(BackendError::UserNotFound(user.to_string())),
        }
    }

    fn on_user_disconnect(&self, data: &CallbackData<'_>) -> BackendResult<()> {
        info!("User {} disconnected", data.user().unwrap_or("<anonymous>"));
        Ok(())
    }

    fn on_session_end(&self, data: &CallbackData<'_>) -> BackendResult<()> {
        let mut dirs = self.lock_dirs()?;
        if dirs.remove(&data.session_id()).is_some() {
            debug!("Dropped working directory of session {}", data.session_id());
        }
        Ok(())
    }

    fn on_path_get_current(&self, data: &CallbackData<'_>) -> BackendResult<String> {
        self.current_dir(data)
    }

    fn on_path_set_current(&self, data: &CallbackData<'_>, path: &str) -> BackendResult<()> {
        let current = self.current_dir(data)?;
        let target = resolve_virtual_path(&current, path)?;
        self.existing_dir(&target)?;
        debug!("Working directory {} -> {}", current, target);
        self.set_current_dir(data, target)
    }

    fn on_path_up(&self, data: &CallbackData<'_>) -> BackendResult<()> {
        let current = self.current_dir(data)?;
        if current == "/" {
            return Ok(());
        }
        let parent = resolve_virtual_path(&current, "..")?;
        self.set_current_dir(data, parent)
    }

    fn on_list(&self, data: &CallbackData<'_>, path: Option<&str>) -> BackendResult<Vec<u8>> {
        let current = self.current_dir(data)?;
        let target = match path {
            Some(path) => resolve_virtual_path(&current, path)?,
            None => current,
        };
        let real_path = self.existing_dir(&target)?;

        let mut names = Vec::new();
        for entry in fs::read_dir(&real_path)? {
            let entry = entry?;
            let mut name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type()?.is_dir() {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        let mut listing = String::new();
        for name in names {
            listing.push_str(&name);
            listing.push_str("\r\n");
        }
        Ok(listing.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SessionState;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_root(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let root = std::env::temp_dir().join(format!("ftpctl-local-{}-{}", tag, nanos));
        fs::create_dir_all(root.join("docs/reports")).unwrap();
        fs::write(root.join("readme.txt"), b"hello").unwrap();
        root
    }

    fn backend(root: &Path) -> LocalBackend {
        let mut users = HashMap::new();
        users.insert("alice".to_string(), "alice123".to_string());
        LocalBackend::new(root, users)
    }

    fn alice(session_id: u64) -> SessionState {
        let mut state = SessionState::new(session_id, None);
        state.set_user(Some("alice".into()));
        state
    }

    #[test]
    fn test_resolve_virtual_path() {
        assert_eq!(resolve_virtual_path("/", "docs").unwrap(), "/docs");
        assert_eq!(resolve_virtual_path("/docs", "reports/./").unwrap(), "/docs/reports");
        assert_eq!(resolve_virtual_path("/docs/reports", "../..").unwrap(), "/");
        assert_eq!(resolve_virtual_path("/docs", "/other").unwrap(), "/other");
        assert!(matches!(
            resolve_virtual_path("/", ".."),
            Err(BackendError::PathTraversal(_))
        ));
        assert!(resolve_virtual_path("/", "").is_err());
    }

    #[test]
    fn test_credentials() {
        let root = temp_root("creds");
        let backend = backend(&root);
        let state = SessionState::default();
        let data = CallbackData::new(&state);

        assert!(backend.on_user_connect(&data, "alice").is_ok());
        assert_eq!(
            backend.on_user_connect(&data, "bob"),
            Err(BackendError::UserNotFound("bob".into()))
        );
        assert!(backend.on_user_authenticate(&data, "alice", "alice123").is_ok());
        assert!(backend.on_user_authenticate(&data, "alice", "nope").is_err());

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_navigation() {
        let root = temp_root("nav");
        let backend = backend(&root);
        let state = alice(1);
        let data = CallbackData::new(&state);

        assert_eq!(backend.on_path_get_current(&data).unwrap(), "/");
        backend.on_path_set_current(&data, "docs/reports").unwrap();
        assert_eq!(backend.on_path_get_current(&data).unwrap(), "/docs/reports");
        backend.on_path_up(&data).unwrap();
        assert_eq!(backend.on_path_get_current(&data).unwrap(), "/docs");

        assert!(matches!(
            backend.on_path_set_current(&data, "missing"),
            Err(BackendError::NotFound(_))
        ));
        assert!(matches!(
            backend.on_path_set_current(&data, "/readme.txt"),
            Err(BackendError::NotADirectory(_))
        ));
        assert_eq!(backend.on_path_get_current(&data).unwrap(), "/docs");

        backend.on_path_up(&data).unwrap();
        backend.on_path_up(&data).unwrap();
        assert_eq!(backend.on_path_get_current(&data).unwrap(), "/");

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_listing() {
        let root = temp_root("list");
        let backend = backend(&root);
        let state = alice(1);
        let data = CallbackData::new(&state);

        let listing = backend.on_list(&data, None).unwrap();
        assert_eq!(String::from_utf8(listing).unwrap(), "docs/\r\nreadme.txt\r\n");

        let listing = backend.on_list(&data, Some("docs")).unwrap();
        assert_eq!(String::from_utf8(listing).unwrap(), "reports/\r\n");

        assert!(backend.on_list(&data, Some("nowhere")).is_err());

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_session_end_forgets_working_dir() {
        let root = temp_root("end");
        let backend = backend(&root);
        let state = alice(1);
        let data = CallbackData::new(&state);

        backend.on_path_set_current(&data, "docs").unwrap();
        backend.on_session_end(&data).unwrap();
        assert!(backend.working_dirs.lock().unwrap().is_empty());
        assert_eq!(backend.on_path_get_current(&data).unwrap(), "/");

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn test_sessions_of_one_user_keep_separate_dirs() {
        let root = temp_root("twice");
        let backend = backend(&root);
        let first = alice(1);
        let second = alice(2);
        let first_data = CallbackData::new(&first);
        let second_data = CallbackData::new(&second);

        backend.on_path_set_current(&first_data, "docs/reports").unwrap();
        backend.on_path_set_current(&second_data, "docs").unwrap();
        assert_eq!(backend.on_path_get_current(&first_data).unwrap(), "/docs/reports");
        assert_eq!(backend.on_path_get_current(&second_data).unwrap(), "/docs");

        // A session that only named the user shares nothing with them either
        let mut pending = SessionState::new(3, None);
        pending.set_user(Some("alice".into()));
        let pending_data = CallbackData::new(&pending);
        backend.on_path_up(&pending_data).unwrap();
        assert_eq!(backend.on_path_get_current(&pending_data).unwrap(), "/");
        assert_eq!(backend.on_path_get_current(&first_data).unwrap(), "/docs/reports");

        fs::remove_dir_all(root).unwrap();
    }
}
