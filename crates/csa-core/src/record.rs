//! Parser for the CSA game record format: initial position setup, the
//! move history, and the free-form game-information header lines.

use crate::error::{ProtocolClientError, Result};
use crate::model::{Piece, PieceType, State, Turn};
use crate::mv::Move;

/// Free-form header fields a CSA record file may carry above the position
/// and move list. All optional: a minimal record has none of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameInfo {
    pub version: String,
    pub black_name: Option<String>,
    pub white_name: Option<String>,
    pub event: Option<String>,
    pub site: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub time_limit: Option<String>,
    pub opening: Option<String>,
}

/// Standard piece counts for a full, two-player set (hand piece types only).
fn full_set_counts() -> [(PieceType, u32); 7] {
    [
        (PieceType::Fu, 9),
        (PieceType::Ky, 2),
        (PieceType::Ke, 2),
        (PieceType::Gi, 2),
        (PieceType::Ki, 2),
        (PieceType::Ka, 1),
        (PieceType::Hi, 1),
    ]
}

/// Reads a complete CSA record (as a sequence of already-split lines) into
/// its game information, initial position, and move history.
pub struct Record;

impl Record {
    pub fn read(lines: &[String]) -> Result<(GameInfo, State, Vec<Move>)> {
        let mut info = GameInfo {
            version: "1.0".to_string(),
            ..GameInfo::default()
        };
        let mut state = State::new();
        let mut history = Vec::new();
        let mut saw_position = false;

        for raw_line in lines {
            for token in raw_line.split(',') {
                let line = token.trim();
                if line.is_empty() || line.starts_with('\'') {
                    continue;
                }

                if let Some(rest) = line.strip_prefix('V') {
                    if rest.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                        info.version = rest.to_string();
                        continue;
                    }
                }
                if let Some(name) = line.strip_prefix("N+") {
                    info.black_name = Some(name.to_string());
                    continue;
                }
                if let Some(name) = line.strip_prefix("N-") {
                    info.white_name = Some(name.to_string());
                    continue;
                }
                if let Some(rest) = line.strip_prefix('$') {
                    if let Some((key, value)) = rest.split_once(':') {
                        let value = Some(value.to_string());
                        match key {
                            "EVENT" => info.event = value,
                            "SITE" => info.site = value,
                            "START_TIME" => info.start_time = value,
                            "END_TIME" => info.end_time = value,
                            "TIME_LIMIT" => info.time_limit = value,
                            "OPENING" => info.opening = value,
                            _ => {}
                        }
                    }
                    continue;
                }
                if let Some(rest) = line.strip_prefix("PI") {
                    state.set_hirate();
                    apply_handicap(&mut state, rest)?;
                    saw_position = true;
                    continue;
                }
                if let Some(rest) = line.strip_prefix("P+") {
                    apply_piece_placements(&mut state, Turn::Black, rest)?;
                    saw_position = true;
                    continue;
                }
                if let Some(rest) = line.strip_prefix("P-") {
                    apply_piece_placements(&mut state, Turn::White, rest)?;
                    saw_position = true;
                    continue;
                }
                if line.len() == 1 && matches!(line, "+" | "-") {
                    if saw_position && history.is_empty() {
                        state.to_move = Turn::parse(line.chars().next().unwrap()).unwrap();
                    } else if !saw_position {
                        state.to_move = Turn::parse(line.chars().next().unwrap()).unwrap();
                    } else {
                        // A bare "+"/"-" after moves have started is the
                        // special "consecutive move" marker; not tracked
                        // as a move of its own.
                    }
                    continue;
                }
                if let Some(rank_line) = line.strip_prefix('P') {
                    if rank_line.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                        apply_rank_line(&mut state, rank_line)?;
                        saw_position = true;
                        continue;
                    }
                }
                if line.starts_with('T') && line[1..].chars().all(|c| c.is_ascii_digit()) {
                    if let Some(last) = history.last_mut() {
                        let secs: u32 = line[1..].parse().unwrap_or(0);
                        *last = Move::parse(last_raw(last), Some(secs))
                            .map_err(|e| ProtocolClientError::ProtocolError(e.to_string()))?;
                    }
                    continue;
                }
                if line.starts_with('+') || line.starts_with('-') || line.starts_with('%') || line.starts_with('#') {
                    let (move_part, elapsed) = match line.split_once(",T") {
                        Some((m, t)) => (m, t.parse().ok()),
                        None => (line, None),
                    };
                    let mv = Move::parse(move_part, elapsed)
                        .map_err(|e| ProtocolClientError::ProtocolError(e.to_string()))?;
                    history.push(mv);
                    continue;
                }
            }
        }

        if !saw_position {
            state.set_hirate();
        }

        Ok((info, state, history))
    }
}

fn last_raw(mv: &Move) -> &str {
    mv.raw()
}

fn apply_rank_line(state: &mut State, rank_line: &str) -> Result<()> {
    let rank: u32 = rank_line[..1]
        .parse()
        .map_err(|_| ProtocolClientError::ProtocolError(format!("bad rank line: P{rank_line}")))?;
    let body = &rank_line[1..];
    let cells: Vec<&str> = body
        .as_bytes()
        .chunks(3)
        .map(|c| std::str::from_utf8(c).unwrap_or(""))
        .collect();
    if cells.len() != 9 {
        return Err(ProtocolClientError::ProtocolError(format!("bad rank line: P{rank_line}")));
    }
    for (i, cell) in cells.iter().enumerate() {
        let file = 9 - i as u32;
        let pos = format!("{file}{rank}");
        if cell.trim() == "*" {
            continue;
        }
        let piece = Piece::parse(cell)
            .ok_or_else(|| ProtocolClientError::ProtocolError(format!("bad piece cell: {cell}")))?;
        state.set(&pos, piece);
    }
    Ok(())
}

fn apply_piece_placements(state: &mut State, turn: Turn, rest: &str) -> Result<()> {
    if rest == "00AL" {
        credit_all_remaining(state, turn);
        return Ok(());
    }
    let tokens: Vec<&str> = rest.as_bytes().chunks(4).map(|c| std::str::from_utf8(c).unwrap_or("")).collect();
    for token in tokens {
        if token.len() != 4 {
            return Err(ProtocolClientError::ProtocolError(format!("bad placement token: {token}")));
        }
        if token == "00AL" {
            credit_all_remaining(state, turn);
            continue;
        }
        let pos = &token[..2];
        let piece_type = PieceType::parse(&token[2..])
            .ok_or_else(|| ProtocolClientError::ProtocolError(format!("bad piece type: {token}")))?;
        state.set(pos, Piece::new(turn, piece_type));
    }
    Ok(())
}

/// Resolves a `PI` line's handicap list: `PI` alone leaves the hirate
/// position untouched; `PI<pos><pt>...` removes each named board piece.
fn apply_handicap(state: &mut State, rest: &str) -> Result<()> {
    let tokens: Vec<&str> = rest.as_bytes().chunks(4).map(|c| std::str::from_utf8(c).unwrap_or("")).collect();
    for token in tokens {
        if token.len() != 4 {
            return Err(ProtocolClientError::ProtocolError(format!("bad handicap token: {token}")));
        }
        let pos = &token[..2];
        let piece_type = PieceType::parse(&token[2..])
            .ok_or_else(|| ProtocolClientError::ProtocolError(format!("bad piece type: {token}")))?;
        if let Some(piece) = state.get_board(pos) {
            if piece.piece_type == piece_type {
                state.reset(pos, piece);
            }
        }
    }
    Ok(())
}

/// Implements the `"00AL"` shorthand: every hand piece type not yet fully
/// accounted for across both sides' board and hand goes to `turn`'s hand.
fn credit_all_remaining(state: &mut State, turn: Turn) {
    for (pt, total) in full_set_counts() {
        let mut used = 0u32;
        for turn in [Turn::Black, Turn::White] {
            used += state.get_hand(Piece::new(turn, pt));
        }
        for file in 1..=9u32 {
            for rank in 1..=9u32 {
                let pos = format!("{file}{rank}");
                if let Some(piece) = state.get_board(&pos) {
                    if piece.piece_type.unpromote() == pt {
                        used += 1;
                    }
                }
            }
        }
        let remaining = total.saturating_sub(used);
        for _ in 0..remaining {
            state.set("00", Piece::new(turn, pt));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &[&str]) -> Vec<String> {
        s.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn parses_header_fields() {
        let (info, _, _) = Record::read(&lines(&[
            "V2.2",
            "N+alice",
            "N-bob",
            "$EVENT:test match",
            "PI",
            "+",
        ]))
        .unwrap();
        assert_eq!(info.version, "2.2");
        assert_eq!(info.black_name.as_deref(), Some("alice"));
        assert_eq!(info.white_name.as_deref(), Some("bob"));
        assert_eq!(info.event.as_deref(), Some("test match"));
    }

    #[test]
    fn plain_pi_is_hirate() {
        let (_, state, _) = Record::read(&lines(&["PI", "+"])).unwrap();
        let mut hirate = State::new();
        hirate.set_hirate();
        assert_eq!(state, hirate);
    }

    #[test]
    fn handicap_removes_named_pieces() {
        // Two-piece handicap: remove White's rook and bishop.
        let (_, state, _) = Record::read(&lines(&["PI82HI22KA", "+"])).unwrap();
        assert!(state.get_board("82").is_none());
        assert!(state.get_board("22").is_none());
        assert!(state.get_board("28").is_some());
    }

    #[test]
    fn parses_move_history_with_elapsed_time() {
        let (_, _, history) = Record::read(&lines(&["PI", "+", "+2726FU", "T12", "-3334FU", "T8"])).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].elapsed, Some(12));
        assert_eq!(history[1].elapsed, Some(8));
    }

    #[test]
    fn handles_combined_comma_time_suffix() {
        let (_, _, history) = Record::read(&lines(&["PI", "+", "+2726FU,T12"])).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].elapsed, Some(12));
    }

    #[test]
    fn zero_al_credits_remaining_pieces_to_hand() {
        // Black's rook is placed on the board; everything else
        // unaccounted for in a full set goes to White's hand.
        let (_, state, _) = Record::read(&lines(&["P+28HI", "P-00AL", "+"])).unwrap();
        assert_eq!(state.get_hand(Piece::new(Turn::White, PieceType::Hi)), 0);
        assert_eq!(state.get_hand(Piece::new(Turn::White, PieceType::Fu)), 9);
    }
}
