//! Protocol client, shogi record model, and wire parsers for the CSA
//! shogi server protocol (record_v2 / tcp_ip_server_113).

pub mod client;
pub mod error;
pub mod game;
pub mod line_buffer;
pub mod model;
pub mod mv;
pub mod record;
pub mod summary;
pub mod transport;

pub use client::{ClientState, MoveOutcome, ProtocolClient};
pub use error::{ProtocolClientError, Result};
pub use game::Game;
pub use line_buffer::LineBuffer;
pub use model::{Piece, PieceType, Position, State, Turn};
pub use mv::{Move, MoveFormatError};
pub use record::{GameInfo, Record};
pub use summary::{GameSummary, SummaryNode};
pub use transport::{TcpTransport, Transport};
