//! FTP Protocol implementation
//!
//! Handles FTP command parsing, the verb table, per-verb handlers and reply
//! formatting.

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod responses;

pub use commands::{COMMAND_TABLE, CommandEntry, CommandId, lookup_command};
pub use handlers::{CommandContext, CommandHandler, CommandResult};
pub use parser::{MAX_TOKENS, ParsedCommand, parse_command, tokenize};
pub use responses::{Reply, ReplyCode, format_reply, format_reply_text};
