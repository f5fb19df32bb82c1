//! Command handlers module for the FTP control-connection engine.
//!
//! One handler per verb. Handlers validate their own argument counts, call
//! into the host backend where needed and return the reply to send. Errors
//! are mapped to replies by the dispatcher.

use crate::backend::{CallbackData, FtpBackend};
use crate::client::{AuthState, SessionState};
use crate::config::EngineOptions;
use crate::error::CommandError;
use crate::protocol::responses::{Reply, ReplyCode};
use log::{debug, info, warn};

/// Everything a handler may touch while serving one command.
pub struct CommandContext<'a> {
    pub state: &'a mut SessionState,
    pub backend: &'a dyn FtpBackend,
    pub options: &'a EngineOptions,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        state: &'a mut SessionState,
        backend: &'a dyn FtpBackend,
        options: &'a EngineOptions,
    ) -> Self {
        Self {
            state,
            backend,
            options,
        }
    }

    fn callback_data(&self) -> CallbackData<'_> {
        CallbackData::new(&*self.state)
    }
}

pub type CommandResult = Result<Reply, CommandError>;

/// Signature shared by every entry of the command table.
pub type CommandHandler = fn(&mut CommandContext<'_>, &[String]) -> CommandResult;

fn single_arg(args: &[String]) -> Result<&str, CommandError> {
    match args {
        [arg] => Ok(arg.as_str()),
        _ => Err(CommandError::InvalidParameter),
    }
}

pub fn handle_cmd_abor(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

/// Handles the CDUP command: moves the backend's current directory up one level.
pub fn handle_cmd_cdup(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    ctx.backend.on_path_up(&ctx.callback_data())?;
    Ok(ReplyCode::Okay.into())
}

/// Handles the CWD command: changes the backend's current directory.
pub fn handle_cmd_cwd(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let path = single_arg(args)?;
    ctx.backend.on_path_set_current(&ctx.callback_data(), path)?;
    Ok(ReplyCode::Okay.into())
}

/// Handles the LIST command.
///
/// The listing is produced by the backend but there is no data connection to
/// carry it, so it is dropped after a successful call.
pub fn handle_cmd_list(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let path = match args {
        [] => None,
        [path] => Some(path.as_str()),
        _ => return Err(CommandError::InvalidParameter),
    };

    let listing = ctx.backend.on_list(&ctx.callback_data(), path)?;
    debug!(
        "Listing of {} produced {} bytes",
        path.unwrap_or("current directory"),
        listing.len()
    );
    Ok(ReplyCode::Okay.into())
}

pub fn handle_cmd_mode(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Ok(ReplyCode::Okay.into())
}

pub fn handle_cmd_noop(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    ctx.state.touch();
    Ok(ReplyCode::Okay.into())
}

/// Handles the PASS command: checks the password against the user named by a
/// prior successful USER.
pub fn handle_cmd_pass(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let password = single_arg(args)?;

    let user = match (ctx.state.auth_state(ctx.options.max_failed_logins), ctx.state.user()) {
        (AuthState::Authenticated, _) => return Ok(ReplyCode::BadSequence.into()),
        (AuthState::Locked, _) => return Ok(ReplyCode::NotLoggedIn.into()),
        (_, Some(user)) => user.to_string(),
        (_, None) => return Err(CommandError::InvalidParameter),
    };

    let outcome = ctx
        .backend
        .on_user_authenticate(&ctx.callback_data(), &user, password);
    match outcome {
        Ok(()) => {
            ctx.state.set_logged_in(true);
            info!("User {} logged in", user);
            Ok(ReplyCode::LoggedInProceed.into())
        }
        Err(e) => {
            let e = CommandError::from(e);
            if e == CommandError::NotImplemented {
                return Err(e);
            }
            ctx.state.record_failed_login();
            warn!(
                "Login failed for user {} ({} failed attempts): {}",
                user,
                ctx.state.failed_logins(),
                e
            );
            Ok(ReplyCode::NotLoggedIn.into())
        }
    }
}

pub fn handle_cmd_port(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

/// Handles the PWD command: replies with the backend's current directory as a
/// plain text line.
pub fn handle_cmd_pwd(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    let path = ctx.backend.on_path_get_current(&ctx.callback_data())?;
    Ok(Reply::Text(path))
}

/// QUIT is answered by the dispatcher's disconnect path.
pub fn handle_cmd_quit(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

pub fn handle_cmd_retr(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

pub fn handle_cmd_rget(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

pub fn handle_cmd_stat(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

/// Handles the SYST command: replies with the server's OS name.
pub fn handle_cmd_syst(ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    let name = match &ctx.options.system_name {
        Some(name) => name.clone(),
        None => os_product_name().to_string(),
    };
    Ok(Reply::Text(name))
}

pub fn handle_cmd_type(_ctx: &mut CommandContext<'_>, _args: &[String]) -> CommandResult {
    Err(CommandError::NotImplemented)
}

/// Handles the USER command: looks the account up and stores the name on
/// success.
pub fn handle_cmd_user(ctx: &mut CommandContext<'_>, args: &[String]) -> CommandResult {
    let user = single_arg(args)?;

    match ctx.state.auth_state(ctx.options.max_failed_logins) {
        AuthState::Authenticated => return Ok(ReplyCode::BadSequence.into()),
        AuthState::Locked => return Ok(ReplyCode::NotLoggedIn.into()),
        AuthState::Unauthenticated | AuthState::UserNamed => {}
    }

    ctx.state.set_user(None);

    let outcome = ctx.backend.on_user_connect(&ctx.callback_data(), user);
    match outcome {
        Ok(()) => {
            ctx.state.set_user(Some(user.to_string()));
            Ok(ReplyCode::UsernameOkayNeedPassword.into())
        }
        Err(e) => {
            let e = CommandError::from(e);
            if e == CommandError::NotImplemented {
                return Err(e);
            }
            ctx.state.record_failed_login();
            warn!(
                "Unknown user {} ({} failed attempts): {}",
                user,
                ctx.state.failed_logins(),
                e
            );
            Ok(ReplyCode::NotLoggedIn.into())
        }
    }
}

/// Product name of the running operating system.
pub fn os_product_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        "netbsd" => "NetBSD",
        "openbsd" => "OpenBSD",
        "solaris" | "illumos" => "SunOS",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendResult, NullBackend};
    use crate::error::BackendError;

    struct Accounts;

    impl FtpBackend for Accounts {
        fn on_user_connect(&self, _data: &CallbackData<'_>, user: &str) -> BackendResult<()> {
            if user == "bob" {
                Ok(())
            } else {
                Err(BackendError::UserNotFound(user.into()))
            }
        }

        fn on_user_authenticate(
            &self,
            _data: &CallbackData<'_>,
            user: &str,
            password: &str,
        ) -> BackendResult<()> {
            if user == "bob" && password == "secret" {
                Ok(())
            } else {
                Err(BackendError::AccessDenied(user.into()))
            }
        }

        fn on_path_get_current(&self, data: &CallbackData<'_>) -> BackendResult<String> {
            Ok(format!("/home/{}", data.user().unwrap_or("nobody")))
        }

        fn on_path_set_current(&self, _data: &CallbackData<'_>, path: &str) -> BackendResult<()> {
            if path == "missing" {
                Err(BackendError::NotFound(path.into()))
            } else {
                Ok(())
            }
        }
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_user_then_pass() {
        let mut state = SessionState::default();
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(
            handle_cmd_user(&mut ctx, &args(&["bob"])),
            Ok(ReplyCode::UsernameOkayNeedPassword.into())
        );
        assert_eq!(
            handle_cmd_pass(&mut ctx, &args(&["secret"])),
            Ok(ReplyCode::LoggedInProceed.into())
        );
        assert!(state.is_logged_in());
        assert_eq!(state.failed_logins(), 0);
    }

    #[test]
    fn test_unknown_user_counts_failure_and_clears_name() {
        let mut state = SessionState::default();
        state.set_user(Some("bob".into()));
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(
            handle_cmd_user(&mut ctx, &args(&["mallory"])),
            Ok(ReplyCode::NotLoggedIn.into())
        );
        assert_eq!(state.user(), None);
        assert_eq!(state.failed_logins(), 1);
    }

    #[test]
    fn test_bad_password_keeps_user() {
        let mut state = SessionState::default();
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        handle_cmd_user(&mut ctx, &args(&["bob"])).unwrap();
        assert_eq!(
            handle_cmd_pass(&mut ctx, &args(&["wrong"])),
            Ok(ReplyCode::NotLoggedIn.into())
        );
        assert_eq!(state.user(), Some("bob"));
        assert_eq!(state.failed_logins(), 1);
        assert!(!state.is_logged_in());
    }

    #[test]
    fn test_pass_without_user_is_invalid() {
        let mut state = SessionState::default();
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(
            handle_cmd_pass(&mut ctx, &args(&["secret"])),
            Err(CommandError::InvalidParameter)
        );
        assert_eq!(state.failed_logins(), 0);
    }

    #[test]
    fn test_argument_counts() {
        let mut state = SessionState::default();
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(handle_cmd_user(&mut ctx, &[]), Err(CommandError::InvalidParameter));
        assert_eq!(
            handle_cmd_cwd(&mut ctx, &args(&["a", "b"])),
            Err(CommandError::InvalidParameter)
        );
        assert_eq!(
            handle_cmd_list(&mut ctx, &args(&["a", "b"])),
            Err(CommandError::InvalidParameter)
        );
    }

    #[test]
    fn test_login_twice_is_bad_sequence() {
        let mut state = SessionState::default();
        state.set_user(Some("bob".into()));
        state.set_logged_in(true);
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(
            handle_cmd_user(&mut ctx, &args(&["bob"])),
            Ok(ReplyCode::BadSequence.into())
        );
        assert_eq!(
            handle_cmd_pass(&mut ctx, &args(&["secret"])),
            Ok(ReplyCode::BadSequence.into())
        );
        assert!(state.is_logged_in());
    }

    #[test]
    fn test_locked_session_skips_backend() {
        let mut state = SessionState::default();
        state.set_user(Some("bob".into()));
        state.record_failed_login();
        let options = EngineOptions {
            max_failed_logins: 1,
            ..EngineOptions::default()
        };
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(
            handle_cmd_pass(&mut ctx, &args(&["secret"])),
            Ok(ReplyCode::NotLoggedIn.into())
        );
        assert_eq!(
            handle_cmd_user(&mut ctx, &args(&["bob"])),
            Ok(ReplyCode::NotLoggedIn.into())
        );
        assert!(!state.is_logged_in());
        assert_eq!(state.failed_logins(), 1);
    }

    #[test]
    fn test_unset_auth_callbacks_do_not_count_as_failures() {
        let mut state = SessionState::default();
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &NullBackend, &options);

        assert_eq!(
            handle_cmd_user(&mut ctx, &args(&["bob"])),
            Err(CommandError::NotImplemented)
        );
        assert_eq!(state.failed_logins(), 0);
    }

    #[test]
    fn test_directory_commands() {
        let mut state = SessionState::default();
        state.set_user(Some("bob".into()));
        let options = EngineOptions::default();
        let mut ctx = CommandContext::new(&mut state, &Accounts, &options);

        assert_eq!(
            handle_cmd_pwd(&mut ctx, &[]),
            Ok(Reply::Text("/home/bob".into()))
        );
        assert_eq!(
            handle_cmd_cwd(&mut ctx, &args(&["docs"])),
            Ok(ReplyCode::Okay.into())
        );
        assert!(matches!(
            handle_cmd_cwd(&mut ctx, &args(&["missing"])),
            Err(CommandError::Failed(_))
        ));
        assert_eq!(handle_cmd_cdup(&mut ctx, &[]), Err(CommandError::NotImplemented));
        assert_eq!(handle_cmd_list(&mut ctx, &[]), Err(CommandError::NotImplemented));
    }

    #[test]
    fn test_stubs_and_fixed_replies() {
        let mut state = SessionState::default();
        let options = EngineOptions {
            system_name: Some("UNIX Type: L8".into()),
            ..EngineOptions::default()
        };
        let mut ctx = CommandContext::new(&mut state, &NullBackend, &options);

        let stubs: [CommandHandler; 7] = [
            handle_cmd_abor,
            handle_cmd_port,
            handle_cmd_quit,
            handle_cmd_retr,
            handle_cmd_rget,
            handle_cmd_stat,
            handle_cmd_type,
        ];
        for stub in stubs {
            assert_eq!(stub(&mut ctx, &[]), Err(CommandError::NotImplemented));
        }

        assert_eq!(handle_cmd_mode(&mut ctx, &args(&["S"])), Ok(ReplyCode::Okay.into()));
        assert_eq!(
            handle_cmd_syst(&mut ctx, &[]),
            Ok(Reply::Text("UNIX Type: L8".into()))
        );
    }

    #[test]
    fn test_noop_touches_clock() {
        let mut state = SessionState::default();
        let options = EngineOptions::default();
        let before = std::time::Instant::now();
        let mut ctx = CommandContext::new(&mut state, &NullBackend, &options);

        assert_eq!(handle_cmd_noop(&mut ctx, &[]), Ok(ReplyCode::Okay.into()));
        assert!(state.last_command_time() >= before);
    }
}
