use log::{debug, error, info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, BufReader};

use crate::backend::CallbackData;
use crate::client::{AuthState, SessionState};
use crate::error::command_error_reply;
use crate::protocol::commands::{CommandId, lookup_command};
use crate::protocol::handlers::CommandContext;
use crate::protocol::parser::{ParsedCommand, parse_command};
use crate::protocol::responses::{Reply, ReplyCode, send_reply, send_reply_text};
use crate::server::ServerShared;

/// Why a session ended without a transport error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The server was full; the client got 421 instead of a greeting.
    Rejected,
    /// The client sent QUIT.
    Quit,
    /// Too many failed login attempts.
    LockedOut,
    /// The client closed the control connection.
    PeerClosed,
}

enum LineRead {
    Line(Vec<u8>),
    TooLong,
    Eof,
}

/// Serves one FTP control connection from greeting to close.
///
/// - Reserves a session slot first; a full server answers 421 and returns
///   `SessionEnd::Rejected`.
/// - Sends the 220 greeting, then reads and dispatches commands in order.
/// - Notifies the backend through `on_session_end` on every exit path once
///   the session has started.
/// - Returns `Err` on a transport failure of the control connection.
pub async fn handle_client<S>(
    stream: S,
    shared: &ServerShared,
    client_addr: Option<SocketAddr>,
) -> io::Result<SessionEnd>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    let Some(_guard) = shared.try_session_guard() else {
        warn!(
            "Rejecting {}: {} sessions already active",
            peer_label(client_addr.as_ref()),
            shared.max_clients()
        );
        send_reply(&mut writer, ReplyCode::ServiceNotAvailable).await?;
        return Ok(SessionEnd::Rejected);
    };

    let mut state = SessionState::new(shared.next_session_id(), client_addr);
    state.reset();

    send_reply(&mut writer, ReplyCode::ReadyForNewUser).await?;

    let result = process_commands(&mut reader, &mut writer, &mut state, shared).await;

    if let Err(e) = shared.backend().on_session_end(&CallbackData::new(&state)) {
        debug!("Session end notification for session {} returned: {}", state.session_id(), e);
    }

    state.reset();
    result
}

/// The command loop of an established session.
pub(crate) async fn process_commands<R, W>(
    reader: &mut R,
    writer: &mut W,
    state: &mut SessionState,
    shared: &ServerShared,
) -> io::Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let options = shared.options();
    let peer = peer_label(state.client_addr());

    loop {
        let raw = match read_command_line(reader, options.max_command_length).await {
            Ok(LineRead::Line(raw)) => raw,
            Ok(LineRead::TooLong) => {
                warn!("Command from {} exceeds {} bytes", peer, options.max_command_length);
                send_reply(writer, ReplyCode::CommandNotRecognized).await?;
                continue;
            }
            Ok(LineRead::Eof) => {
                info!("Connection closed by client {}", peer);
                return Ok(SessionEnd::PeerClosed);
            }
            Err(e) => {
                error!("Failed to read from {}: {}", peer, e);
                let _ = send_reply(writer, ReplyCode::CommandNotRecognized).await;
                return Err(e);
            }
        };

        let Ok(line) = String::from_utf8(raw) else {
            send_reply(writer, ReplyCode::InvalidParameters).await?;
            continue;
        };

        let command = match parse_command(strip_terminator(&line)) {
            Ok(Some(command)) => command,
            Ok(None) => {
                send_reply(writer, ReplyCode::InvalidParameters).await?;
                continue;
            }
            Err(e) => {
                debug!("Unparsable command from {}: {}", peer, e);
                send_reply(writer, ReplyCode::InvalidParameters).await?;
                continue;
            }
        };

        info!("Received from {}: {}", peer, loggable(&command));

        let Some(entry) = lookup_command(&command.verb) else {
            send_reply(writer, ReplyCode::CommandNotImplemented).await?;
            continue;
        };

        state.touch();

        let result = if options.require_auth
            && entry.id.touches_filesystem()
            && state.auth_state(options.max_failed_logins) != AuthState::Authenticated
        {
            Ok(Reply::Code(ReplyCode::NotLoggedIn))
        } else {
            let mut ctx = CommandContext::new(state, shared.backend(), options);
            (entry.handler)(&mut ctx, &command.args)
        };

        if let Ok(reply) = &result {
            write_reply(writer, reply).await?;
        }

        let locked_out = state.auth_state(options.max_failed_logins) == AuthState::Locked;
        if entry.id == CommandId::Quit || locked_out {
            send_reply(writer, ReplyCode::ClosingControlConnection).await?;

            if let Err(e) = shared.backend().on_user_disconnect(&CallbackData::new(state)) {
                debug!("Disconnect notification for {} returned: {}", peer, e);
            }

            return Ok(if entry.id == CommandId::Quit {
                SessionEnd::Quit
            } else {
                warn!("Client {} locked out after {} failed logins", peer, state.failed_logins());
                SessionEnd::LockedOut
            });
        }

        if let Err(e) = result {
            send_reply(writer, command_error_reply(&e)).await?;
        }
    }
}

/// Reads one command line, bounded by `max_len` bytes.
///
/// An overlong line is consumed up to its terminator and reported as
/// `TooLong`.
async fn read_command_line<R>(reader: &mut R, max_len: usize) -> io::Result<LineRead>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    let n = (&mut *reader)
        .take(max_len as u64)
        .read_until(b'\n', &mut line)
        .await?;

    if n == 0 {
        return Ok(LineRead::Eof);
    }
    if line.last() == Some(&b'\n') || line.len() < max_len {
        return Ok(LineRead::Line(line));
    }

    loop {
        let mut discard = Vec::new();
        let n = (&mut *reader)
            .take(max_len as u64)
            .read_until(b'\n', &mut discard)
            .await?;
        if n == 0 || discard.last() == Some(&b'\n') {
            return Ok(LineRead::TooLong);
        }
    }
}

/// Cuts the line at the first CRLF (or a trailing LF) and drops leading
/// whitespace.
fn strip_terminator(line: &str) -> &str {
    let line = match line.find("\r\n") {
        Some(end) => &line[..end],
        None => line.strip_suffix('\n').unwrap_or(line),
    };
    line.trim_start()
}

async fn write_reply<W>(writer: &mut W, reply: &Reply) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    match reply {
        Reply::Code(code) => send_reply(writer, *code).await,
        Reply::Text(text) => send_reply_text(writer, text).await,
    }
}

fn peer_label(client_addr: Option<&SocketAddr>) -> String {
    client_addr
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn loggable(command: &ParsedCommand) -> String {
    if command.verb.eq_ignore_ascii_case("PASS") {
        format!("{} ****", command.verb)
    } else if command.args.is_empty() {
        command.verb.clone()
    } else {
        format!("{} {}", command.verb, command.args.join(" "))
    }
}
