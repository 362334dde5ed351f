//! Error types for the CSA protocol client.

use std::fmt::{self, Display, Formatter};
use std::io;

/// Errors a [`crate::client::ProtocolClient`] operation can raise.
#[derive(Debug)]
pub enum ProtocolClientError {
    /// The transport was closed by the peer, or returned EOF.
    ///
    /// Always fatal to the session: a new connection is required.
    Disconnected,
    /// An operation was invoked while the client was in a state that doesn't
    /// allow it. The client's state is left unchanged.
    StateError(String),
    /// The server sent a message that isn't valid at this point in the
    /// protocol. The game must be considered over; the client's internal
    /// state is no longer meaningful.
    ProtocolError(String),
    /// A candidate move string violates the CSA move grammar.
    MoveFormat(String),
    /// A lower-level I/O failure that isn't a clean disconnect.
    Io(io::Error),
}

impl Display for ProtocolClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolClientError::Disconnected => write!(f, "connection closed by peer"),
            ProtocolClientError::StateError(msg) => write!(f, "state error: {msg}"),
            ProtocolClientError::ProtocolError(msg) => write!(f, "protocol error: {msg}"),
            ProtocolClientError::MoveFormat(msg) => write!(f, "invalid move format: {msg}"),
            ProtocolClientError::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for ProtocolClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolClientError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolClientError {
    fn from(err: io::Error) -> Self {
        // A peer that closes mid-read usually surfaces as one of these kinds
        // rather than a clean `Ok(0)`, depending on the platform.
        match err.kind() {
            io::ErrorKind::UnexpectedEof | io::ErrorKind::ConnectionReset => {
                ProtocolClientError::Disconnected
            }
            _ => ProtocolClientError::Io(err),
        }
    }
}

/// Result alias used throughout `csa-core`.
pub type Result<T> = std::result::Result<T, ProtocolClientError>;
