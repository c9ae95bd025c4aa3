pub mod analysis;
pub mod fen;
pub mod position;
pub mod san;
pub mod types;
pub mod uci;

pub use analysis::{AnalysisScore, EvaluatedPosition};
pub use fen::{FenError, STARTING_FEN};
pub use position::{IllegalMoveError, Move, Position, Rules, StandardRules};
pub use san::SanError;
pub use types::{PieceColor, PieceKind};

/// All legal moves for the side to move, in cozy-chess notation.
pub fn legal_moves(board: &cozy_chess::Board) -> Vec<cozy_chess::Move> {
    let mut moves = Vec::new();
    board.generate_moves(|mvs| {
        moves.extend(mvs);
        false
    });
    moves
}
