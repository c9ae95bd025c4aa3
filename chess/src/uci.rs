//! UCI (Universal Chess Interface) move notation

use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// Convert UCI castling notation to cozy_chess notation
///
/// UCI uses standard notation (king moves 2 squares): e1g1, e1c1, e8g8, e8c8
/// cozy_chess uses king-to-rook notation: e1h1, e1a1, e8h8, e8a8
///
/// This function checks if the move is a castling move and converts it to the
/// appropriate cozy_chess format by finding the matching legal move.
pub fn convert_uci_castling_to_cozy(mv: Move, legal_moves: &[Move]) -> Move {
    let is_rank_1_or_8 = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    let is_e_file = matches!(mv.from.file(), File::E);
    let is_g_or_c_file = matches!(mv.to.file(), File::G | File::C);

    if is_rank_1_or_8 && is_e_file && is_g_or_c_file && mv.promotion.is_none() {
        let rook_file = if mv.to.file() == File::G {
            File::H
        } else {
            File::A
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };

        if legal_moves.contains(&converted) {
            return converted;
        }
    }

    mv
}

/// Whether `mv` is a castling move in cozy_chess notation (king captures own rook).
pub fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
}

/// Format a move in standard UCI notation (e.g. "e2e4", "e7e8q", "e1g1").
///
/// Castling is written as the king's two-square step, not cozy_chess's
/// king-to-rook form, so the result matches what engines and GUIs expect.
pub fn format_uci_move(board: &Board, mv: Move) -> String {
    if is_castling(board, mv) {
        let king_file = if mv.to.file() as u8 > mv.from.file() as u8 {
            File::G
        } else {
            File::C
        };
        let to = Square::new(king_file, mv.from.rank());
        return format!("{}{}", mv.from, to);
    }

    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(promo.into());
    }
    s
}

/// Parse standard UCI text into a legal cozy_chess move on `board`.
///
/// Returns `None` when the text is not UCI or names an illegal move.
pub fn parse_uci_move(board: &Board, text: &str) -> Option<Move> {
    let text = text.trim();
    if !(4..=5).contains(&text.len()) || !text.is_ascii() {
        return None;
    }

    let from: Square = text[0..2].parse().ok()?;
    let to: Square = text[2..4].parse().ok()?;
    let promotion = match text.get(4..5) {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return None,
    };

    let legal = crate::legal_moves(board);
    let mv = convert_uci_castling_to_cozy(
        Move {
            from,
            to,
            promotion,
        },
        &legal,
    );
    legal.contains(&mv).then_some(mv)
}
