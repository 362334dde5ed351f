//! Parsing and rendering of CSA move tokens.

use std::fmt::{self, Display, Formatter};

use crate::model::{is_board_position, PieceType, Position, Turn, POS_HAND};

/// A parsed CSA move token: either a normal move (piece + squares) or a
/// special move (`#...`/`%...`), plus however much consumed time the
/// server reported for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub is_special: bool,
    pub turn: Option<Turn>,
    pub from: Option<Position>,
    pub to: Option<Position>,
    pub piece_type: Option<PieceType>,
    raw: String,
    pub elapsed: Option<u32>,
}

/// The move string didn't match the CSA move grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveFormatError(pub String);

impl Display for MoveFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "invalid move format: {}", self.0)
    }
}

impl std::error::Error for MoveFormatError {}

impl Move {
    /// Parses a raw move token (normal or special), with an optional
    /// consumed-time suffix (the `,T<k>` part is supplied separately as
    /// `elapsed`, already stripped from `raw`).
    pub fn parse(raw: &str, elapsed: Option<u32>) -> Result<Move, MoveFormatError> {
        let raw = raw.to_uppercase();

        if raw.starts_with('#') || raw.starts_with('%') {
            return Ok(Move {
                is_special: true,
                turn: None,
                from: None,
                to: None,
                piece_type: None,
                raw,
                elapsed,
            });
        }

        if raw.chars().count() != 7 {
            return Err(MoveFormatError(raw));
        }
        let chars: Vec<char> = raw.chars().collect();
        let turn = Turn::parse(chars[0]).ok_or_else(|| MoveFormatError(raw.clone()))?;
        let from: String = chars[1..3].iter().collect();
        let to: String = chars[3..5].iter().collect();
        let piece_type_str: String = chars[5..7].iter().collect();
        let piece_type = PieceType::parse(&piece_type_str).ok_or_else(|| MoveFormatError(raw.clone()))?;

        if from != POS_HAND && !is_board_position(&from) {
            return Err(MoveFormatError(raw));
        }
        if !is_board_position(&to) {
            return Err(MoveFormatError(raw));
        }
        if from == POS_HAND && !piece_type.is_hand_piece() {
            return Err(MoveFormatError(raw));
        }

        Ok(Move {
            is_special: false,
            turn: Some(turn),
            from: Some(from),
            to: Some(to),
            piece_type: Some(piece_type),
            raw,
            elapsed,
        })
    }

    /// The raw CSA token, without any `,T<k>` suffix.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Display for Move {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)?;
        if let Some(elapsed) = self.elapsed {
            write!(f, ",T{elapsed}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_normal_move() {
        let m = Move::parse("+7776FU", None).unwrap();
        assert!(!m.is_special);
        assert_eq!(m.turn, Some(Turn::Black));
        assert_eq!(m.from.as_deref(), Some("77"));
        assert_eq!(m.to.as_deref(), Some("76"));
        assert_eq!(m.piece_type, Some(PieceType::Fu));
        assert_eq!(m.to_string(), "+7776FU");
    }

    #[test]
    fn renders_elapsed_time() {
        let m = Move::parse("+7776FU", Some(12)).unwrap();
        assert_eq!(m.to_string(), "+7776FU,T12");
    }

    #[test]
    fn parses_drop_from_hand() {
        let m = Move::parse("-0055FU", None).unwrap();
        assert_eq!(m.from.as_deref(), Some("00"));
        assert_eq!(m.piece_type, Some(PieceType::Fu));
    }

    #[test]
    fn rejects_drop_of_non_hand_piece() {
        assert!(Move::parse("-0055OU", None).is_err());
    }

    #[test]
    fn rejects_slash_leading_character() {
        // The CSA protocol only defines `+`/`-`; this client does not
        // accept the `/` some older clients tolerated.
        assert!(Move::parse("/7776FU", None).is_err());
    }

    #[test]
    fn parses_special_move() {
        let m = Move::parse("%TORYO", None).unwrap();
        assert!(m.is_special);
        assert_eq!(m.to_string(), "%TORYO");
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(Move::parse("+77776FU", None).is_err());
    }
}
