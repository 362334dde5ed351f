//! The playable game aggregate: summary + position + move history.

use crate::error::{ProtocolClientError, Result};
use crate::model::{Piece, State, Turn, POS_HAND};
use crate::mv::Move;
use crate::record::Record;
use crate::summary::GameSummary;

/// Combines a [`GameSummary`], the live [`State`] it was built from, and
/// the moves played since, into a single mutable aggregate.
pub struct Game {
    pub id: String,
    pub my_turn: Turn,
    pub state: State,
    pub history: Vec<Move>,
    pub condition: GameSummary,
}

impl Game {
    /// Builds a [`Game`] from a freshly negotiated [`GameSummary`],
    /// reconstructing the initial position from its verbatim `Position` block.
    pub fn new(condition: GameSummary) -> Result<Game> {
        let lines: Vec<String> = condition.position.lines().map(str::to_string).collect();
        let (_, state, _) = Record::read(&lines)?;
        Ok(Game { id: condition.game_id.clone(), my_turn: condition.your_turn, state, history: Vec::new(), condition })
    }

    pub fn is_my_turn(&self) -> bool {
        self.state.to_move == self.my_turn
    }

    /// Applies `mv` to the live position and appends it to history.
    /// Special moves (resign, declare-win, ...) only append; they never
    /// touch the board.
    pub fn apply(&mut self, mv: Move) -> Result<()> {
        if mv.is_special {
            self.history.push(mv);
            return Ok(());
        }

        let turn = mv.turn.ok_or_else(|| ProtocolClientError::ProtocolError("normal move missing turn".into()))?;
        let from = mv.from.clone().ok_or_else(|| ProtocolClientError::ProtocolError("normal move missing from".into()))?;
        let to = mv.to.clone().ok_or_else(|| ProtocolClientError::ProtocolError("normal move missing to".into()))?;
        let piece_type = mv
            .piece_type
            .ok_or_else(|| ProtocolClientError::ProtocolError("normal move missing piece type".into()))?;

        if let Some(captured) = self.state.get_board(&to) {
            if captured.turn != turn {
                self.state.set(POS_HAND, Piece::new(turn, captured.piece_type.unpromote()));
            }
        }

        let moved = Piece::new(turn, piece_type);
        self.state.reset(&from, moved);
        self.state.set(&to, moved);
        self.state.to_move = turn.flip();

        self.history.push(mv);
        Ok(())
    }

    /// A human-readable rendering of the current position and whose turn
    /// it is, for the shell's `INFO` command.
    pub fn to_display_string(&self) -> String {
        format!("{}\nmove {} | to move: {}\n", self.state, self.history.len() + 1, self.state.to_move)
    }

    /// One line per played move, 1-indexed, for the shell's `HISTORY` command.
    pub fn history_str(&self) -> String {
        self.history
            .iter()
            .enumerate()
            .map(|(i, mv)| format!("{:03}: {mv}", i + 1))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summary::TimeSettings;
    use std::collections::HashMap;

    fn sample_summary() -> GameSummary {
        let position = [
            "P1-KY-KE-GI-KI-OU-KI-GI-KE-KY",
            "P2 * -HI *  *  *  *  * -KA * ",
            "P3-FU-FU-FU-FU-FU-FU-FU-FU-FU",
            "P4 *  *  *  *  *  *  *  *  * ",
            "P5 *  *  *  *  *  *  *  *  * ",
            "P6 *  *  *  *  *  *  *  *  * ",
            "P7+FU+FU+FU+FU+FU+FU+FU+FU+FU",
            "P8 * +KA *  *  *  *  * +HI * ",
            "P9+KY+KE+GI+KI+OU+KI+GI+KE+KY",
            "+",
        ]
        .join("\n");

        GameSummary {
            protocol_version: "1.1".to_string(),
            protocol_mode: "Server".to_string(),
            format: "Shogi 1.0".to_string(),
            declaration: "Jishogi 1.1".to_string(),
            game_id: "game1".to_string(),
            name_black: "alice".to_string(),
            name_white: "bob".to_string(),
            your_turn: Turn::Black,
            rematch_on_draw: "NO".to_string(),
            to_move: Turn::Black,
            position,
            time: TimeSettings {
                time_unit: "1sec".to_string(),
                total_time: "1500".to_string(),
                least_time_per_move: "1".to_string(),
                byoyomi: None,
            },
            extra: HashMap::new(),
        }
    }

    #[test]
    fn new_game_reconstructs_hirate_from_position_block() {
        let game = Game::new(sample_summary()).unwrap();
        let mut hirate = State::new();
        hirate.set_hirate();
        assert_eq!(game.state, hirate);
        assert!(game.is_my_turn());
    }

    #[test]
    fn apply_moves_piece_and_flips_turn() {
        let mut game = Game::new(sample_summary()).unwrap();
        let mv = Move::parse("+7776FU", Some(1)).unwrap();
        game.apply(mv).unwrap();
        assert!(game.state.get_board("77").is_none());
        assert_eq!(game.state.get_board("76"), Some(Piece::new(Turn::Black, crate::model::PieceType::Fu)));
        assert_eq!(game.state.to_move, Turn::White);
        assert_eq!(game.history.len(), 1);
    }

    #[test]
    fn apply_capture_adds_unpromoted_piece_to_hand() {
        let mut game = Game::new(sample_summary()).unwrap();
        // Place a black silver next to white's bishop and capture it,
        // ignoring legality (the client does not validate it, §1).
        game.state.set("23", Piece::new(Turn::Black, crate::model::PieceType::Gi));
        let mv = Move::parse("+2322GI", None).unwrap();
        game.apply(mv).unwrap();
        assert_eq!(game.state.get_hand(Piece::new(Turn::Black, crate::model::PieceType::Ka)), 1);
    }

    #[test]
    fn special_move_only_appends_to_history() {
        let mut game = Game::new(sample_summary()).unwrap();
        let before = game.state.clone();
        let mv = Move::parse("%TORYO", None).unwrap();
        game.apply(mv).unwrap();
        assert_eq!(game.state, before);
        assert_eq!(game.history.len(), 1);
    }
}
