//! Error handlers
//!
//! Converts handler failures into FTP reply codes.

use crate::error::types::CommandError;
use crate::protocol::responses::ReplyCode;
use log::warn;

/// Convert a handler error to the reply sent for it.
///
/// `Failed` carries no specific reply of its own, so it is answered with a
/// generic 500 rather than leaving the client without a response.
pub fn command_error_reply(err: &CommandError) -> ReplyCode {
    match err {
        CommandError::InvalidParameter => ReplyCode::InvalidParameters,
        CommandError::NotImplemented => ReplyCode::CommandNotImplemented,
        CommandError::Failed(reason) => {
            warn!("Unmapped command failure: {}", reason);
            ReplyCode::CommandNotRecognized
        }
    }
}
