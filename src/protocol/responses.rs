//! FTP Response handling
//!
//! Defines FTP reply codes and the wire framing of replies.

use std::fmt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Standard FTP reply codes used by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyCode {
    Okay,
    ReadyForNewUser,
    ClosingControlConnection,
    LoggedInProceed,
    UsernameOkayNeedPassword,
    ServiceNotAvailable,
    CommandNotRecognized,
    InvalidParameters,
    CommandNotImplemented,
    BadSequence,
    NotLoggedIn,
}

impl ReplyCode {
    /// Numeric three-digit value of the reply
    pub fn code(self) -> u16 {
        match self {
            ReplyCode::Okay => 200,
            ReplyCode::ReadyForNewUser => 220,
            ReplyCode::ClosingControlConnection => 221,
            ReplyCode::LoggedInProceed => 230,
            ReplyCode::UsernameOkayNeedPassword => 331,
            ReplyCode::ServiceNotAvailable => 421,
            ReplyCode::CommandNotRecognized => 500,
            ReplyCode::InvalidParameters => 501,
            ReplyCode::CommandNotImplemented => 502,
            ReplyCode::BadSequence => 503,
            ReplyCode::NotLoggedIn => 530,
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// What a handler wants written back for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Code(ReplyCode),
    /// Free text sent as-is, without a code prefix.
    Text(String),
}

impl From<ReplyCode> for Reply {
    fn from(code: ReplyCode) -> Self {
        Reply::Code(code)
    }
}

/// Format a bare reply code line
pub fn format_reply(code: ReplyCode) -> String {
    format!("{}\r\n", code.code())
}

/// Format a free-text reply line
pub fn format_reply_text(message: &str) -> String {
    format!("{}\r\n", message)
}

/// Write a reply code to the control connection as a single framed write.
pub async fn send_reply<W>(writer: &mut W, code: ReplyCode) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &format_reply(code)).await
}

/// Write a free-text reply to the control connection.
pub async fn send_reply_text<W>(writer: &mut W, message: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_line(writer, &format_reply_text(message)).await
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
