//! The CSA protocol client state machine (spec §4.G): the line-oriented
//! request/response engine that drives one game from login to logout.

use crate::error::{ProtocolClientError, Result};
use crate::line_buffer::LineBuffer;
use crate::mv::Move;
use crate::summary::{parse_summary_tree, GameSummary};
use crate::transport::Transport;

/// The client's position in its lifecycle. Any operation invoked outside
/// its listed precondition state fails with [`ProtocolClientError::StateError`]
/// and leaves the state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Connected,
    GameWaiting,
    AgreeWaiting,
    StartWaiting,
    GameToMove,
    GameToWait,
}

/// The result of a move-bearing operation: `move`, `get_move`, `resign`,
/// `declare_win`. `end_reason`/`end_result` are present iff the game ended
/// on this step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub cmd: Option<String>,
    pub elapsed: Option<u32>,
    pub end_reason: Option<String>,
    pub end_result: Option<String>,
}

impl MoveOutcome {
    fn ended(cmd: Option<String>, elapsed: Option<u32>, reason: &str, result: &str) -> Self {
        Self { cmd, elapsed, end_reason: Some(reason.to_string()), end_result: Some(result.to_string()) }
    }

    fn ongoing(cmd: Option<String>, elapsed: Option<u32>) -> Self {
        Self { cmd, elapsed, end_reason: None, end_result: None }
    }
}

const MOVE_END_PAIRS: &[(&str, &str)] = &[
    ("#SENNICHITE", "#DRAW"),
    ("#OUTE_SENNICHITE", "#WIN"),
    ("#ILLEGAL_MOVE", "#LOSE"),
    ("#TIME_UP", "#LOSE"),
];

const GET_MOVE_END_PAIRS: &[(&str, &str)] = &[
    ("#SENNICHITE", "#DRAW"),
    ("#OUTE_SENNICHITE", "#LOSE"),
    ("#ILLEGAL_MOVE", "#WIN"),
    ("#TIME_UP", "#WIN"),
    ("#RESIGN", "#WIN"),
    ("#JISHOGI", "#LOSE"),
];

const RESIGN_END_PAIRS: &[(&str, &str)] = &[("#RESIGN", "#LOSE"), ("#TIME_UP", "#LOSE")];

const DECLARE_WIN_END_PAIRS: &[(&str, &str)] =
    &[("#JISHOGI", "#WIN"), ("#ILLEGAL_MOVE", "#LOSE"), ("#TIME_UP", "#LOSE")];

fn is_end_marker(line: &str) -> bool {
    line.starts_with('#')
}

fn validate_pair(reason: &str, result: &str, matrix: &[(&str, &str)]) -> Result<()> {
    if matrix.iter().any(|(r, o)| *r == reason && *o == result) {
        Ok(())
    } else {
        Err(ProtocolClientError::ProtocolError(format!("unexpected end-of-game pair: {reason} {result}")))
    }
}

/// Splits a trailing `,T<digits>` suffix off `line`, if present.
fn split_time_suffix(line: &str) -> (&str, Option<u32>) {
    match line.split_once(",T") {
        Some((head, digits)) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
            (head, digits.parse().ok())
        }
        _ => (line, None),
    }
}

/// Tries to read `line` as a move confirmation: a normal move always
/// requires the `,T<k>` suffix; a special move may omit it.
fn parse_move_confirmation(line: &str) -> Option<(String, Option<u32>)> {
    let (head, elapsed) = split_time_suffix(line);
    if head == line {
        // No ,T suffix at all: only a special move confirmation can omit it.
        if line.starts_with('%') && Move::parse(line, None).is_ok() {
            return Some((line.to_string(), None));
        }
        return None;
    }
    if Move::parse(head, None).is_ok() {
        Some((head.to_string(), elapsed))
    } else {
        None
    }
}

pub struct ProtocolClient<T: Transport> {
    buffer: LineBuffer<T>,
    state: ClientState,
}

impl<T: Transport> ProtocolClient<T> {
    pub fn new(transport: T) -> Self {
        Self { buffer: LineBuffer::new(transport), state: ClientState::Connected }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    fn require(&self, expected: ClientState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(ProtocolClientError::StateError(format!("expected {expected:?}, was {:?}", self.state)))
        }
    }

    pub fn login(&mut self, username: &str, password: &str) -> Result<(bool, String)> {
        self.require(ClientState::Connected)?;
        self.buffer.send_line(&format!("LOGIN {username} {password}"))?;
        let line = self.buffer.pop()?;
        if let Some(rest) = line.strip_prefix("LOGIN:") {
            if rest == "incorrect" {
                return Ok((false, line));
            }
            if rest.trim_end().ends_with(" OK") {
                self.state = ClientState::GameWaiting;
                return Ok((true, line));
            }
        }
        Err(ProtocolClientError::ProtocolError(line))
    }

    pub fn logout(&mut self) -> Result<(bool, String)> {
        self.require(ClientState::GameWaiting)?;
        self.buffer.send_line("LOGOUT")?;
        let line = self.buffer.pop()?;
        if line == "LOGOUT:completed" {
            self.state = ClientState::Connected;
            Ok((true, line))
        } else {
            Err(ProtocolClientError::ProtocolError(line))
        }
    }

    /// Accumulates lines up to and including `END Game_Summary`, then
    /// parses them per §4.F.
    pub fn get_game_condition(&mut self) -> Result<GameSummary> {
        self.require(ClientState::GameWaiting)?;
        let mut lines = Vec::new();
        loop {
            let line = self.buffer.pop()?;
            let done = line == "END Game_Summary";
            lines.push(line);
            if done {
                break;
            }
        }
        let tree = parse_summary_tree(&lines)?;
        let summary = GameSummary::from_tree(&tree)?;
        self.state = ClientState::AgreeWaiting;
        Ok(summary)
    }

    pub fn agree(&mut self, cond: &GameSummary) -> Result<()> {
        self.require(ClientState::AgreeWaiting)?;
        self.buffer.send_line(&format!("AGREE {}", cond.game_id))?;
        self.state = ClientState::StartWaiting;
        Ok(())
    }

    pub fn reject(&mut self, cond: &GameSummary) -> Result<String> {
        self.require(ClientState::AgreeWaiting)?;
        self.buffer.send_line(&format!("REJECT {}", cond.game_id))?;
        let line = self.buffer.pop()?;
        if line.starts_with(&format!("REJECT:{} by ", cond.game_id)) {
            self.state = ClientState::GameWaiting;
            Ok(line)
        } else {
            Err(ProtocolClientError::ProtocolError(line))
        }
    }

    pub fn get_agreement(&mut self, cond: &GameSummary) -> Result<(bool, String)> {
        self.require(ClientState::StartWaiting)?;
        let line = self.buffer.pop()?;
        if line == format!("START:{}", cond.game_id) {
            self.state = if cond.to_move == cond.your_turn { ClientState::GameToMove } else { ClientState::GameToWait };
            Ok((true, line))
        } else if line.starts_with(&format!("REJECT:{} by ", cond.game_id)) {
            self.state = ClientState::GameWaiting;
            Ok((false, line))
        } else {
            Err(ProtocolClientError::ProtocolError(line))
        }
    }

    /// Consumes a buffered `#reason` / `#result` pair, already known to be
    /// present at the front of the buffer.
    fn consume_end_pair(&mut self, matrix: &[(&str, &str)]) -> Result<(String, String)> {
        let reason = self.buffer.pop()?;
        let result = self.buffer.pop()?;
        validate_pair(&reason, &result, matrix)?;
        Ok((reason, result))
    }

    pub fn mv(&mut self, candidate: &str) -> Result<MoveOutcome> {
        self.require(ClientState::GameToMove)?;
        Move::parse(candidate, None).map_err(|e| ProtocolClientError::MoveFormat(e.to_string()))?;

        self.buffer.drain_available()?;
        if self.peek_two_buffered_are_end()? {
            let (reason, result) = self.consume_end_pair(MOVE_END_PAIRS)?;
            self.state = ClientState::GameWaiting;
            return Ok(MoveOutcome::ended(Some(candidate.to_string()), None, &reason, &result));
        }

        self.buffer.send_line(candidate)?;
        let line = self.buffer.pop()?;
        let elapsed = match split_time_suffix(&line) {
            (head, Some(k)) if head == candidate => Some(k),
            _ => {
                self.buffer.unshift(line);
                None
            }
        };

        self.buffer.drain_available()?;
        if self.peek_two_buffered_are_end()? {
            let (reason, result) = self.consume_end_pair(MOVE_END_PAIRS)?;
            self.state = ClientState::GameWaiting;
            return Ok(MoveOutcome::ended(Some(candidate.to_string()), elapsed, &reason, &result));
        }

        match elapsed {
            Some(_) => {
                self.state = ClientState::GameToWait;
                Ok(MoveOutcome::ongoing(Some(candidate.to_string()), elapsed))
            }
            None => Err(ProtocolClientError::ProtocolError("move confirmation never arrived".to_string())),
        }
    }

    pub fn get_move(&mut self) -> Result<MoveOutcome> {
        self.require(ClientState::GameToWait)?;
        let line = self.buffer.pop()?;

        let (cmd, elapsed) = match parse_move_confirmation(&line) {
            Some((cmd, elapsed)) => {
                // The server may repeat a special move's bare command once
                // more, in either order relative to ,T; swallow it if so.
                if cmd.starts_with('%') || cmd.starts_with('#') {
                    if let Some(next) = self.buffer.peek()? {
                        if next == cmd {
                            self.buffer.pop()?;
                        }
                    }
                }
                (Some(cmd), elapsed)
            }
            None => {
                self.buffer.unshift(line);
                (None, None)
            }
        };

        self.buffer.drain_available()?;
        if self.peek_two_buffered_are_end()? {
            let (reason, result) = self.consume_end_pair(GET_MOVE_END_PAIRS)?;
            self.state = ClientState::GameWaiting;
            return Ok(MoveOutcome::ended(cmd, elapsed, &reason, &result));
        }

        match elapsed {
            Some(_) => {
                self.state = ClientState::GameToMove;
                Ok(MoveOutcome::ongoing(cmd, elapsed))
            }
            None => Err(ProtocolClientError::ProtocolError("move confirmation never arrived".to_string())),
        }
    }

    fn move_special(&mut self, cmd: &str, allowed: &[(&str, &str)]) -> Result<MoveOutcome> {
        self.require(ClientState::GameToMove)?;
        self.buffer.send_line(cmd)?;

        let line = self.buffer.pop()?;
        let (elapsed, leftover) = match split_time_suffix(&line) {
            (head, Some(k)) if head == cmd => (Some(k), None),
            _ if line == cmd => (None, None),
            _ => (None, Some(line)),
        };

        let reason = match leftover {
            Some(line) => line,
            None => self.buffer.pop()?,
        };
        let reason = if reason == cmd { self.buffer.pop()? } else { reason };
        let result = self.buffer.pop()?;
        validate_pair(&reason, &result, allowed)?;

        self.state = ClientState::GameWaiting;
        Ok(MoveOutcome::ended(Some(cmd.to_string()), elapsed, &reason, &result))
    }

    pub fn resign(&mut self) -> Result<MoveOutcome> {
        self.move_special("%TORYO", RESIGN_END_PAIRS)
    }

    pub fn declare_win(&mut self) -> Result<MoveOutcome> {
        self.move_special("%KACHI", DECLARE_WIN_END_PAIRS)
    }

    /// Peeks without consuming: `true` iff the next two lines (pulling
    /// fresh ones from the transport if needed) both start with `#`.
    fn peek_two_buffered_are_end(&mut self) -> Result<bool> {
        let first = match self.buffer.peek()? {
            Some(line) => line,
            None => return Ok(false),
        };
        if !is_end_marker(&first) {
            return Ok(false);
        }
        let popped_first = self.buffer.pop()?;
        let second = self.buffer.peek()?;
        self.buffer.unshift(popped_first);
        Ok(matches!(second, Some(line) if is_end_marker(&line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedTransport {
        inbound: VecDeque<String>,
        pub outbound: Vec<String>,
    }

    impl ScriptedTransport {
        fn new(inbound: &[&str]) -> Self {
            Self { inbound: inbound.iter().map(|s| s.to_string()).collect(), outbound: Vec::new() }
        }
    }

    impl Transport for ScriptedTransport {
        fn send_line(&mut self, line: &str) -> Result<()> {
            self.outbound.push(line.to_string());
            Ok(())
        }

        fn read_line(&mut self) -> Result<String> {
            self.inbound.pop_front().ok_or(ProtocolClientError::Disconnected)
        }

        fn read_available(&mut self) -> Result<Vec<String>> {
            Ok(self.inbound.drain(..).collect())
        }
    }

    #[test]
    fn login_then_logout() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["LOGIN:alice OK", "LOGOUT:completed"]));
        let (ok, msg) = client.login("alice", "secret").unwrap();
        assert!(ok);
        assert_eq!(msg, "LOGIN:alice OK");
        assert_eq!(client.state(), ClientState::GameWaiting);

        let (ok, msg) = client.logout().unwrap();
        assert!(ok);
        assert_eq!(msg, "LOGOUT:completed");
        assert_eq!(client.state(), ClientState::Connected);
    }

    #[test]
    fn login_rejected_leaves_state_unchanged() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["LOGIN:incorrect"]));
        let (ok, msg) = client.login("alice", "wrong").unwrap();
        assert!(!ok);
        assert_eq!(msg, "LOGIN:incorrect");
        assert_eq!(client.state(), ClientState::Connected);
    }

    #[test]
    fn move_with_confirmation() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["+7776FU,T1"]));
        client.state = ClientState::GameToMove;
        let outcome = client.mv("+7776FU").unwrap();
        assert_eq!(outcome.cmd.as_deref(), Some("+7776FU"));
        assert_eq!(outcome.elapsed, Some(1));
        assert!(outcome.end_reason.is_none());
        assert_eq!(client.state(), ClientState::GameToWait);
    }

    #[test]
    fn move_ends_in_sennichite_draw() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["#SENNICHITE", "#DRAW"]));
        client.state = ClientState::GameToMove;
        let outcome = client.mv("+7776FU").unwrap();
        assert_eq!(outcome.end_reason.as_deref(), Some("#SENNICHITE"));
        assert_eq!(outcome.end_result.as_deref(), Some("#DRAW"));
        assert_eq!(client.state(), ClientState::GameWaiting);
    }

    #[test]
    fn resign_reports_loss() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["%TORYO,T3", "#RESIGN", "#LOSE"]));
        client.state = ClientState::GameToMove;
        let outcome = client.resign().unwrap();
        assert_eq!(outcome.cmd.as_deref(), Some("%TORYO"));
        assert_eq!(outcome.elapsed, Some(3));
        assert_eq!(outcome.end_reason.as_deref(), Some("#RESIGN"));
        assert_eq!(outcome.end_result.as_deref(), Some("#LOSE"));
        assert_eq!(client.state(), ClientState::GameWaiting);
    }

    #[test]
    fn get_move_sees_opponent_resignation() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["%TORYO", "#RESIGN", "#WIN"]));
        client.state = ClientState::GameToWait;
        let outcome = client.get_move().unwrap();
        assert_eq!(outcome.cmd.as_deref(), Some("%TORYO"));
        assert_eq!(outcome.end_reason.as_deref(), Some("#RESIGN"));
        assert_eq!(outcome.end_result.as_deref(), Some("#WIN"));
        assert_eq!(client.state(), ClientState::GameWaiting);
    }

    #[test]
    fn get_move_normal_confirmation() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&["-3334FU,T2"]));
        client.state = ClientState::GameToWait;
        let outcome = client.get_move().unwrap();
        assert_eq!(outcome.cmd.as_deref(), Some("-3334FU"));
        assert_eq!(outcome.elapsed, Some(2));
        assert_eq!(client.state(), ClientState::GameToMove);
    }

    #[test]
    fn operation_in_wrong_state_is_state_error() {
        let mut client = ProtocolClient::new(ScriptedTransport::new(&[]));
        let err = client.logout().unwrap_err();
        assert!(matches!(err, ProtocolClientError::StateError(_)));
        assert_eq!(client.state(), ClientState::Connected);
    }
}
