//! Module `commands`
//!
//! Defines the fixed table of FTP verbs understood by the engine and the
//! lookup used by the dispatcher.

use crate::protocol::handlers::{self, CommandHandler};

/// Canonical identifier of every supported FTP command.
///
/// Alphabetical, named after the official command names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Abor, // Abort the current command
    Cdup, // Change to parent directory
    Cwd,  // Change working directory
    List, // List a directory
    Mode, // Set transfer mode
    Noop, // No operation
    Pass, // Password for login
    Port, // Active mode data port
    Pwd,  // Print working directory
    Quit, // Terminate the session
    Retr, // Retrieve a file
    Rget, // Recursively retrieve a directory
    Stat, // Transfer status
    Syst, // Server OS info
    Type, // Set representation type
    User, // Username for login
}

/// One row of the command table.
pub struct CommandEntry {
    pub id: CommandId,
    pub verb: &'static str,
    pub handler: CommandHandler,
}

/// Table of handled commands.
pub static COMMAND_TABLE: &[CommandEntry] = &[
    CommandEntry { id: CommandId::Abor, verb: "ABOR", handler: handlers::handle_cmd_abor },
    CommandEntry { id: CommandId::Cdup, verb: "CDUP", handler: handlers::handle_cmd_cdup },
    CommandEntry { id: CommandId::Cwd, verb: "CWD", handler: handlers::handle_cmd_cwd },
    CommandEntry { id: CommandId::List, verb: "LIST", handler: handlers::handle_cmd_list },
    CommandEntry { id: CommandId::Mode, verb: "MODE", handler: handlers::handle_cmd_mode },
    CommandEntry { id: CommandId::Noop, verb: "NOOP", handler: handlers::handle_cmd_noop },
    CommandEntry { id: CommandId::Pass, verb: "PASS", handler: handlers::handle_cmd_pass },
    CommandEntry { id: CommandId::Port, verb: "PORT", handler: handlers::handle_cmd_port },
    CommandEntry { id: CommandId::Pwd, verb: "PWD", handler: handlers::handle_cmd_pwd },
    CommandEntry { id: CommandId::Quit, verb: "QUIT", handler: handlers::handle_cmd_quit },
    CommandEntry { id: CommandId::Retr, verb: "RETR", handler: handlers::handle_cmd_retr },
    CommandEntry { id: CommandId::Rget, verb: "RGET", handler: handlers::handle_cmd_rget },
    CommandEntry { id: CommandId::Stat, verb: "STAT", handler: handlers::handle_cmd_stat },
    CommandEntry { id: CommandId::Syst, verb: "SYST", handler: handlers::handle_cmd_syst },
    CommandEntry { id: CommandId::Type, verb: "TYPE", handler: handlers::handle_cmd_type },
    CommandEntry { id: CommandId::User, verb: "USER", handler: handlers::handle_cmd_user },
];

/// Looks up a verb in the command table, ignoring ASCII case.
pub fn lookup_command(verb: &str) -> Option<&'static CommandEntry> {
    COMMAND_TABLE
        .iter()
        .find(|entry| entry.verb.eq_ignore_ascii_case(verb))
}

impl CommandId {
    /// Commands that reach the backend's directory callbacks.
    pub fn touches_filesystem(self) -> bool {
        matches!(
            self,
            CommandId::Cdup | CommandId::Cwd | CommandId::List | CommandId::Pwd
        )
    }
}
