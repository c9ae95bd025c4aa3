use cozy_chess::Board;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a Board
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fen = fen.trim();
    if fen.split_whitespace().count() < 4 {
        return Err(FenError::InvalidFormat(fen.to_string()));
    }

    // cozy-chess accepts both standard and Shredder castling fields here
    fen.parse()
        .map_err(|_| FenError::InvalidBoardLayout(fen.to_string()))
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    // Use cozy-chess's Display implementation
    board.to_string()
}

/// The part of a FEN that identifies the board state: placement, side to
/// move, castling rights and en-passant square. Move clocks are dropped.
pub fn position_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid board layout: {0}")]
    InvalidBoardLayout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_fen_roundtrip() {
        let board = parse_fen(STARTING_FEN).unwrap();
        assert_eq!(format_fen(&board), STARTING_FEN);
        assert_eq!(board, Board::default());
    }

    #[test]
    fn test_rejects_truncated_fen() {
        assert!(matches!(
            parse_fen("8/8/8/8/8/8/8/8"),
            Err(FenError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_rejects_bad_layout() {
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::InvalidBoardLayout(_))
        ));
    }

    #[test]
    fn test_position_key_ignores_clocks() {
        assert_eq!(
            position_key("8/8/8/8/8/8/8/K6k w - - 12 40"),
            position_key("8/8/8/8/8/8/8/K6k w - - 0 1")
        );
        assert_ne!(
            position_key("8/8/8/8/8/8/8/K6k w - - 0 1"),
            position_key("8/8/8/8/8/8/8/K6k b - - 0 1")
        );
    }
}
