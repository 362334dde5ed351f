//! A pushback buffer over a [`Transport`], so the protocol state machine
//! can peek at a line, decide it belongs to a different sub-protocol, and
//! put it back for whoever reads next.

use std::collections::VecDeque;

use crate::error::Result;
use crate::transport::Transport;

/// Wraps a [`Transport`] with a FIFO of lines read ahead of need.
///
/// The move/confirmation/game-end disambiguation in
/// [`crate::client::ProtocolClient`] needs to look at a line, and if it
/// turns out to belong to the other sub-protocol, leave it for the next
/// caller exactly as if it had never been read. [`LineBuffer::unshift`]
/// is what makes that possible.
pub struct LineBuffer<T: Transport> {
    transport: T,
    queue: VecDeque<String>,
}

impl<T: Transport> LineBuffer<T> {
    pub fn new(transport: T) -> Self {
        Self { transport, queue: VecDeque::new() }
    }

    /// Sends a line to the peer; bypasses the buffer entirely.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.transport.send_line(line)
    }

    /// Returns the next line, blocking on the transport if none are
    /// already buffered.
    pub fn pop(&mut self) -> Result<String> {
        if let Some(line) = self.queue.pop_front() {
            return Ok(line);
        }
        self.transport.read_line()
    }

    /// Puts `line` back at the front of the queue, so the next [`Self::pop`]
    /// or [`Self::peek`] returns it again.
    pub fn unshift(&mut self, line: String) {
        self.queue.push_front(line);
    }

    /// Returns the next line without consuming it, pulling from the
    /// transport's non-blocking poll if the buffer is currently empty.
    /// `Ok(None)` means nothing is available right now.
    pub fn peek(&mut self) -> Result<Option<String>> {
        if self.queue.is_empty() {
            let fresh = self.transport.read_available()?;
            self.queue.extend(fresh);
        }
        Ok(self.queue.front().cloned())
    }

    /// Pulls every line immediately available from the transport, without
    /// blocking, and appends it to the buffer. Lines already buffered are
    /// left in place; use [`Self::pop`]/[`Self::peek`] to consume them.
    pub fn drain_available(&mut self) -> Result<()> {
        let fresh = self.transport.read_available()?;
        self.queue.extend(fresh);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque as Fifo;

    struct MockTransport {
        inbound: Fifo<String>,
        outbound: Vec<String>,
    }

    impl MockTransport {
        fn new(inbound: &[&str]) -> Self {
            Self { inbound: inbound.iter().map(|s| s.to_string()).collect(), outbound: Vec::new() }
        }
    }

    impl Transport for MockTransport {
        fn send_line(&mut self, line: &str) -> Result<()> {
            self.outbound.push(line.to_string());
            Ok(())
        }

        fn read_line(&mut self) -> Result<String> {
            self.inbound.pop_front().ok_or(crate::error::ProtocolClientError::Disconnected)
        }

        fn read_available(&mut self) -> Result<Vec<String>> {
            Ok(self.inbound.drain(..).collect())
        }
    }

    #[test]
    fn pop_reads_through_to_transport() {
        let mut buf = LineBuffer::new(MockTransport::new(&["a", "b"]));
        assert_eq!(buf.pop().unwrap(), "a");
        assert_eq!(buf.pop().unwrap(), "b");
    }

    #[test]
    fn unshift_then_pop_returns_pushed_back_line() {
        let mut buf = LineBuffer::new(MockTransport::new(&["a"]));
        let line = buf.pop().unwrap();
        buf.unshift(line);
        assert_eq!(buf.pop().unwrap(), "a");
    }

    #[test]
    fn peek_does_not_consume() {
        let mut buf = LineBuffer::new(MockTransport::new(&["a", "b"]));
        assert_eq!(buf.peek().unwrap().as_deref(), Some("a"));
        assert_eq!(buf.pop().unwrap(), "a");
        assert_eq!(buf.pop().unwrap(), "b");
    }

    #[test]
    fn drain_available_appends_without_disturbing_buffered_lines() {
        let mut buf = LineBuffer::new(MockTransport::new(&["a", "b", "c"]));
        let first = buf.pop().unwrap();
        buf.unshift(first);
        buf.drain_available().unwrap();
        assert_eq!(buf.pop().unwrap(), "a");
        assert_eq!(buf.pop().unwrap(), "b");
        assert_eq!(buf.pop().unwrap(), "c");
    }
}
