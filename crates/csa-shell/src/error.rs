//! Errors a shell command can fail with.

use std::fmt::{self, Display, Formatter};

use csa_core::ProtocolClientError;

/// Errors surfaced by [`crate::commands::ShellCommand::run`].
#[derive(Debug)]
pub enum ShellError {
    /// Propagated from the protocol client; `Disconnected` is special-cased
    /// by the REPL loop to reset to `Init` mode instead of just printing it.
    Protocol(ProtocolClientError),
    /// The command's arguments didn't parse.
    Usage(String),
    /// The command failed for a reason that isn't a protocol error.
    Failed(String),
}

impl Display for ShellError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Protocol(err) => write!(f, "{err}"),
            ShellError::Usage(msg) => write!(f, "usage: {msg}"),
            ShellError::Failed(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ShellError {}

impl From<ProtocolClientError> for ShellError {
    fn from(err: ProtocolClientError) -> Self {
        ShellError::Protocol(err)
    }
}

/// `true` iff `err` is (or wraps) [`ProtocolClientError::Disconnected`].
pub fn is_disconnect(err: &ShellError) -> bool {
    matches!(err, ShellError::Protocol(ProtocolClientError::Disconnected))
}
