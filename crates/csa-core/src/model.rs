//! Board/hand position model: [`Turn`], [`PieceType`], [`Position`], [`Piece`] and [`State`].

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// Which side is to move, or which side a piece belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    Black,
    White,
}

impl Turn {
    /// The opposite side.
    pub fn flip(self) -> Turn {
        match self {
            Turn::Black => Turn::White,
            Turn::White => Turn::Black,
        }
    }

    /// Parses the single-character CSA turn literal (`+` or `-`).
    pub fn parse(c: char) -> Option<Turn> {
        match c {
            '+' => Some(Turn::Black),
            '-' => Some(Turn::White),
            _ => None,
        }
    }

    /// The single-character CSA literal for this turn.
    pub fn as_char(self) -> char {
        match self {
            Turn::Black => '+',
            Turn::White => '-',
        }
    }
}

impl Display for Turn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// One of the 14 shogi piece types, including promoted forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceType {
    Ou,
    Fu,
    Ky,
    Ke,
    Gi,
    Ki,
    Ka,
    Hi,
    To,
    Ny,
    Nk,
    Ng,
    Um,
    Ry,
}

/// Every piece type that can be held in hand (unpromoted, non-king).
pub const HAND_PIECE_TYPES: [PieceType; 7] = [
    PieceType::Fu,
    PieceType::Ky,
    PieceType::Ke,
    PieceType::Gi,
    PieceType::Ki,
    PieceType::Ka,
    PieceType::Hi,
];

impl PieceType {
    /// Parses the two-letter CSA piece type code.
    pub fn parse(s: &str) -> Option<PieceType> {
        Some(match s {
            "OU" => PieceType::Ou,
            "FU" => PieceType::Fu,
            "KY" => PieceType::Ky,
            "KE" => PieceType::Ke,
            "GI" => PieceType::Gi,
            "KI" => PieceType::Ki,
            "KA" => PieceType::Ka,
            "HI" => PieceType::Hi,
            "TO" => PieceType::To,
            "NY" => PieceType::Ny,
            "NK" => PieceType::Nk,
            "NG" => PieceType::Ng,
            "UM" => PieceType::Um,
            "RY" => PieceType::Ry,
            _ => return None,
        })
    }

    /// The two-letter CSA code for this piece type.
    pub fn as_str(self) -> &'static str {
        match self {
            PieceType::Ou => "OU",
            PieceType::Fu => "FU",
            PieceType::Ky => "KY",
            PieceType::Ke => "KE",
            PieceType::Gi => "GI",
            PieceType::Ki => "KI",
            PieceType::Ka => "KA",
            PieceType::Hi => "HI",
            PieceType::To => "TO",
            PieceType::Ny => "NY",
            PieceType::Nk => "NK",
            PieceType::Ng => "NG",
            PieceType::Um => "UM",
            PieceType::Ry => "RY",
        }
    }

    pub fn is_hand_piece(self) -> bool {
        HAND_PIECE_TYPES.contains(&self)
    }

    /// The promoted form of this piece type, or itself if it has none.
    pub fn promote(self) -> PieceType {
        match self {
            PieceType::Fu => PieceType::To,
            PieceType::Ky => PieceType::Ny,
            PieceType::Ke => PieceType::Nk,
            PieceType::Gi => PieceType::Ng,
            PieceType::Ka => PieceType::Um,
            PieceType::Hi => PieceType::Ry,
            other => other,
        }
    }

    /// The unpromoted form of this piece type, or itself if it isn't promoted.
    pub fn unpromote(self) -> PieceType {
        match self {
            PieceType::To => PieceType::Fu,
            PieceType::Ny => PieceType::Ky,
            PieceType::Nk => PieceType::Ke,
            PieceType::Ng => PieceType::Gi,
            PieceType::Um => PieceType::Ka,
            PieceType::Ry => PieceType::Hi,
            other => other,
        }
    }
}

impl Display for PieceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A board square (`"fr"`, file and rank in `'1'..='9'`), or the `"00"`
/// sentinel meaning "in hand".
pub type Position = String;

/// The sentinel [`Position`] value meaning "in hand" rather than on the board.
pub const POS_HAND: &str = "00";

/// Returns `true` if `pos` is a valid board square (not the hand sentinel).
pub fn is_board_position(pos: &str) -> bool {
    pos.len() == 2
        && pos != POS_HAND
        && pos.chars().all(|c| ('1'..='9').contains(&c))
}

/// A piece belonging to a side: `Turn ++ PieceType` (3 CSA characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub turn: Turn,
    pub piece_type: PieceType,
}

impl Piece {
    pub fn new(turn: Turn, piece_type: PieceType) -> Self {
        Self { turn, piece_type }
    }

    /// Parses a 3-character CSA piece literal, e.g. `"+FU"`.
    pub fn parse(s: &str) -> Option<Piece> {
        let mut chars = s.chars();
        let turn = Turn::parse(chars.next()?)?;
        let piece_type = PieceType::parse(chars.as_str())?;
        Some(Piece::new(turn, piece_type))
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.turn, self.piece_type)
    }
}

/// The empty-cell rendering used by [`State`]'s CSA `Position` block,
/// bit-exact with what a CSA server sends.
const EMPTY_CELL: &str = " * ";

/// A shogi position: whose turn it is, what's on the board, and what's in hand.
///
/// Invariants: at most one piece per board [`Position`]; only
/// [`HAND_PIECE_TYPES`] ever carry a positive hand count; an empty square
/// simply has no entry in `board`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct State {
    pub to_move: Turn,
    board: HashMap<Position, Piece>,
    hand: HashMap<Piece, u32>,
}

impl Default for State {
    fn default() -> Self {
        // Constructed explicitly (not derived) so that every instance
        // allocates its own fresh maps: a shared default container here
        // would alias state across games, as it famously did in the
        // Python original this client is modeled after.
        Self {
            to_move: Turn::Black,
            board: HashMap::new(),
            hand: HashMap::new(),
        }
    }
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Places `piece` at `pos`, or adds one to hand if `pos == POS_HAND`.
    pub fn set(&mut self, pos: &str, piece: Piece) {
        if pos == POS_HAND {
            *self.hand.entry(piece).or_insert(0) += 1;
        } else {
            self.board.insert(pos.to_string(), piece);
        }
    }

    /// Removes the piece at `pos`, or one copy from hand if `pos == POS_HAND`.
    ///
    /// No-op if there was nothing to remove (mirrors the original's
    /// `reset_board`/`reset_hand`, which silently tolerate a missing key).
    pub fn reset(&mut self, pos: &str, piece: Piece) {
        if pos == POS_HAND {
            if let Some(count) = self.hand.get_mut(&piece) {
                if *count > 0 {
                    *count -= 1;
                }
            }
        } else {
            self.board.remove(pos);
        }
    }

    pub fn get_board(&self, pos: &str) -> Option<Piece> {
        self.board.get(pos).copied()
    }

    pub fn get_hand(&self, piece: Piece) -> u32 {
        self.hand.get(&piece).copied().unwrap_or(0)
    }

    /// Installs the standard shogi starting position, clearing any hand.
    pub fn set_hirate(&mut self) {
        self.to_move = Turn::Black;
        self.board.clear();
        self.hand.clear();

        use PieceType::*;
        use Turn::*;
        let white_back = [Ky, Ke, Gi, Ki, Ou, Ki, Gi, Ke, Ky];
        let black_back = [Ky, Ke, Gi, Ki, Ou, Ki, Gi, Ke, Ky];
        for (file, pt) in (1..=9).zip(white_back) {
            self.set(&format!("{}1", 10 - file), Piece::new(White, pt));
        }
        for (file, pt) in (1..=9).zip(black_back) {
            self.set(&format!("{}9", 10 - file), Piece::new(Black, pt));
        }
        self.set("82", Piece::new(White, Hi));
        self.set("22", Piece::new(White, Ka));
        self.set("88", Piece::new(Black, Ka));
        self.set("28", Piece::new(Black, Hi));
        for file in 1..=9 {
            self.set(&format!("{file}3"), Piece::new(White, Fu));
            self.set(&format!("{file}7"), Piece::new(Black, Fu));
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for rank in 1..=9 {
            write!(f, "P{rank}")?;
            for file in (1..=9).rev() {
                let pos = format!("{file}{rank}");
                match self.get_board(&pos) {
                    Some(piece) => write!(f, "{piece}")?,
                    None => write!(f, "{EMPTY_CELL}")?,
                }
            }
            writeln!(f)?;
        }
        for turn in [Turn::Black, Turn::White] {
            write!(f, "P{turn}")?;
            for pt in HAND_PIECE_TYPES {
                let piece = Piece::new(turn, pt);
                for _ in 0..self.get_hand(piece) {
                    write!(f, "00{pt}")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "{}", self.to_move)
    }
}
