//! Line-oriented byte transport over a TCP connection.
//!
//! The CSA protocol is strictly line-oriented and LF-terminated in both
//! directions. On top of the ordinary blocking `read_line`, the protocol
//! state machine occasionally needs to ask "has the server already pushed
//! more lines, without blocking for them?" — this is exposed as
//! [`Transport::read_available`], which flips the socket to a zero-timeout
//! poll for the duration of the call and restores the previous timeout on
//! every exit path, mirroring the non-blocking poll used by the `gfx`
//! crate's server connection (`set_nonblocking` around a `read_line` loop
//! that treats `WouldBlock` as "no more data for now").

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{ProtocolClientError, Result};

/// A full-duplex, line-oriented byte channel.
///
/// Implemented by [`TcpTransport`] for production use; tests elsewhere in
/// this crate substitute a scripted in-memory stand-in (see the test
/// modules of `line_buffer` and `client`).
pub trait Transport {
    /// Writes `line` followed by a single `\n` to the peer.
    fn send_line(&mut self, line: &str) -> Result<()>;

    /// Blocks until a complete line (up to but excluding the `\n`) is
    /// available, then returns it. Returns [`ProtocolClientError::Disconnected`]
    /// if the peer closed the connection.
    fn read_line(&mut self) -> Result<String>;

    /// Returns every complete line currently buffered, without blocking
    /// beyond a zero-duration poll of the underlying socket.
    ///
    /// An empty `Vec` means "no additional lines were waiting right now",
    /// not "the connection is closed" — a half-received line with no
    /// trailing `\n` yet is treated the same as no data at all; the next
    /// blocking [`Transport::read_line`] call will complete it.
    fn read_available(&mut self) -> Result<Vec<String>>;
}

/// A [`Transport`] backed by a real TCP socket.
pub struct TcpTransport {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    /// The read timeout last requested by the caller (`None` == block
    /// forever), restored after every non-blocking poll.
    blocking_timeout: Option<Duration>,
    /// Peer address, for the `"{peer} -> ..."`/`"{peer} <- ..."` debug log lines.
    peer: String,
}

impl TcpTransport {
    /// Connects to `addr` and wraps the resulting stream.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr).map_err(ProtocolClientError::Io)?;
        let writer = stream.try_clone().map_err(ProtocolClientError::Io)?;
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "?".to_string());
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
            blocking_timeout: None,
            peer,
        })
    }

    /// Sets the timeout used for ordinary blocking reads. `None` blocks
    /// forever, matching the default behavior of a freshly connected
    /// socket.
    pub fn set_read_timeout(&mut self, timeout: Option<Duration>) -> Result<()> {
        self.blocking_timeout = timeout;
        self.reader
            .get_ref()
            .set_read_timeout(timeout)
            .map_err(ProtocolClientError::Io)
    }

    fn read_one_line_raw(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        match self.reader.read_line(&mut buf) {
            Ok(0) => Err(ProtocolClientError::Disconnected),
            Ok(_) => {
                while buf.ends_with('\n') || buf.ends_with('\r') {
                    buf.pop();
                }
                Ok(Some(buf))
            }
            Err(err) if is_would_block(&err) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

fn is_would_block(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

impl Transport for TcpTransport {
    fn send_line(&mut self, line: &str) -> Result<()> {
        log::debug!("{} -> {line}", self.peer);
        self.writer
            .write_all(line.as_bytes())
            .and_then(|()| self.writer.write_all(b"\n"))
            .map_err(ProtocolClientError::Io)
    }

    fn read_line(&mut self) -> Result<String> {
        self.reader
            .get_ref()
            .set_nonblocking(false)
            .map_err(ProtocolClientError::Io)?;
        self.reader
            .get_ref()
            .set_read_timeout(self.blocking_timeout)
            .map_err(ProtocolClientError::Io)?;
        let line = loop {
            match self.read_one_line_raw()? {
                Some(line) => break line,
                // A blocking read should never report WouldBlock, but if
                // the socket somehow still has a short timeout set, retry.
                None => continue,
            }
        };
        log::debug!("{} <- {line}", self.peer);
        Ok(line)
    }

    fn read_available(&mut self) -> Result<Vec<String>> {
        // `set_read_timeout(Duration::ZERO)` is rejected by the standard
        // library, so the zero-timeout poll demanded by the protocol is
        // implemented with `set_nonblocking` instead, same as the approach
        // used to poll a game server connection once per frame elsewhere
        // in this workspace.
        self.reader
            .get_ref()
            .set_nonblocking(true)
            .map_err(ProtocolClientError::Io)?;
        let result = (|| {
            let mut lines = Vec::new();
            while let Some(line) = self.read_one_line_raw()? {
                log::debug!("{} <- {line}", self.peer);
                lines.push(line);
            }
            Ok(lines)
        })();
        // Restore blocking mode regardless of the outcome above, so a
        // non-blocking poll can never leave the socket stuck that way.
        self.reader
            .get_ref()
            .set_nonblocking(false)
            .map_err(ProtocolClientError::Io)?;
        result
    }
}
