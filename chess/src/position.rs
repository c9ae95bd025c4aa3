//! Immutable position values and the move-legality collaborator.

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::fen::{format_fen, parse_fen, position_key, FenError, STARTING_FEN};
use crate::san::{format_san, parse_san, SanError};
use crate::types::PieceColor;
use crate::uci::{format_uci_move, parse_uci_move};

/// A move as it appears to the rest of the application.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Canonical SAN, including check/mate markers.
    pub san: String,
    /// Standard UCI ("e1g1" for white short castling).
    pub uci: String,
    /// Side that played the move.
    pub color: PieceColor,
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.san)
    }
}

/// One board state plus the move that produced it.
///
/// Equality and hashing consider only the FEN.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    fen: String,
    last_move: Option<Move>,
    turn: PieceColor,
}

impl Position {
    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.last_move.as_ref()
    }

    /// Side to move.
    pub fn turn(&self) -> PieceColor {
        self.turn
    }

    /// FEN without the halfmove and fullmove counters.
    pub fn key(&self) -> String {
        position_key(&self.fen)
    }

    fn from_board(board: &cozy_chess::Board, last_move: Option<Move>) -> Self {
        Self {
            fen: format_fen(board),
            last_move,
            turn: board.side_to_move().into(),
        }
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl Hash for Position {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fen.hash(state);
    }
}

/// Move-legality collaborator: produces starting positions and applies
/// moves written as SAN or UCI text.
pub trait Rules {
    /// The position described by `fen`, or the standard starting position.
    fn start_position(&self, fen: Option<&str>) -> Result<Position, FenError>;

    /// Play `text` from `position`, returning the resulting position.
    fn apply_move(&self, position: &Position, text: &str) -> Result<Position, IllegalMoveError>;
}

/// Standard chess rules backed by cozy-chess.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl Rules for StandardRules {
    fn start_position(&self, fen: Option<&str>) -> Result<Position, FenError> {
        let board = parse_fen(fen.unwrap_or(STARTING_FEN))?;
        Ok(Position::from_board(&board, None))
    }

    fn apply_move(&self, position: &Position, text: &str) -> Result<Position, IllegalMoveError> {
        let mut board = parse_fen(position.fen())?;

        let mv = match parse_san(&board, text) {
            Ok(mv) => mv,
            Err(san_err) => parse_uci_move(&board, text).ok_or_else(|| IllegalMoveError::Illegal {
                fen: position.fen().to_string(),
                text: text.to_string(),
                source: san_err,
            })?,
        };

        let played = Move {
            san: format_san(&board, mv),
            uci: format_uci_move(&board, mv),
            color: board.side_to_move().into(),
        };
        board.play_unchecked(mv);

        Ok(Position::from_board(&board, Some(played)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IllegalMoveError {
    #[error("illegal move {text:?} in position {fen}: {source}")]
    Illegal {
        fen: String,
        text: String,
        source: SanError,
    },
    #[error("invalid position: {0}")]
    InvalidPosition(#[from] FenError),
}
