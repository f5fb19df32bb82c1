//! FTP Command parsing
//!
//! Splits a received command line into a verb and its arguments.
//!
//! Tokens are separated by spaces. Double quotes group a token that contains
//! spaces, using the Microsoft C runtime argument rules: inside quotes `""`
//! is a literal quote, and backslashes only escape when they precede a quote.

use crate::error::ParseError;

/// Maximum number of tokens (verb included) a single line may carry
pub const MAX_TOKENS: usize = 255;

/// A command line split into its verb and arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub verb: String,
    pub args: Vec<String>,
}

/// Parse a command line into a `ParsedCommand`.
///
/// Returns `Ok(None)` for an empty or whitespace-only line.
pub fn parse_command(line: &str) -> Result<Option<ParsedCommand>, ParseError> {
    let mut tokens = tokenize(line)?.into_iter();
    Ok(tokens.next().map(|verb| ParsedCommand {
        verb,
        args: tokens.collect(),
    }))
}

/// Split a line into tokens.
pub fn tokenize(line: &str) -> Result<Vec<String>, ParseError> {
    let line = line.trim_matches(|c: char| c.is_ascii_whitespace());
    let mut chars = line.chars().peekable();
    let mut tokens = Vec::new();

    loop {
        while chars.peek() == Some(&' ') {
            chars.next();
        }
        if chars.peek().is_none() {
            break;
        }

        let mut token = String::new();
        let mut in_quotes = false;

        while let Some(&c) = chars.peek() {
            match c {
                ' ' if !in_quotes => break,
                '\\' => {
                    let mut backslashes = 0;
                    while chars.peek() == Some(&'\\') {
                        chars.next();
                        backslashes += 1;
                    }
                    if chars.peek() == Some(&'"') {
                        token.extend(std::iter::repeat_n('\\', backslashes / 2));
                        if backslashes % 2 == 1 {
                            token.push('"');
                            chars.next();
                        }
                    } else {
                        token.extend(std::iter::repeat_n('\\', backslashes));
                    }
                }
                '"' => {
                    chars.next();
                    if in_quotes && chars.peek() == Some(&'"') {
                        token.push('"');
                        chars.next();
                    } else {
                        in_quotes = !in_quotes;
                    }
                }
                _ => {
                    token.push(c);
                    chars.next();
                }
            }
        }

        tokens.push(token);
    }

    if tokens.len() > MAX_TOKENS {
        return Err(ParseError::TooManyTokens(tokens.len()));
    }

    Ok(tokens)
}
