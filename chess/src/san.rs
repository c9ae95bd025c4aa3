use cozy_chess::{Board, File, Move, Piece, Rank, Square};

use crate::types::PieceKind;
use crate::uci::is_castling;

/// Strip check, mate and annotation suffixes ("+", "#", "!", "?") from SAN text.
pub fn strip_suffixes(san: &str) -> &str {
    san.trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'))
}

/// Parse Standard Algebraic Notation (SAN) move
///
/// Accepts the forms found in real PGN files: optional check/mate markers,
/// trailing annotation glyphs, `0-0` as an alias for `O-O`, and promotions
/// written with or without `=`.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let text = strip_suffixes(san.trim());
    if text.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    match text {
        "O-O" | "0-0" => return find_castle(board, true, san),
        "O-O-O" | "0-0-0" => return find_castle(board, false, san),
        _ => {}
    }

    let pattern = SanPattern::parse(text).ok_or_else(|| SanError::InvalidFormat(san.to_string()))?;

    let mut matching = crate::legal_moves(board)
        .into_iter()
        .filter(|&mv| pattern.matches(board, mv));

    match (matching.next(), matching.next()) {
        (Some(mv), None) => Ok(mv),
        (None, _) => Err(SanError::NoLegalMove(san.to_string())),
        (Some(_), Some(_)) => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Format a legal move as SAN, including disambiguation and check/mate markers.
pub fn format_san(board: &Board, mv: Move) -> String {
    let mut san = if is_castling(board, mv) {
        if mv.to.file() as u8 > mv.from.file() as u8 {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        }
    } else {
        format_piece_move(board, mv)
    };

    let mut after = board.clone();
    after.play_unchecked(mv);
    if !after.checkers().is_empty() {
        if crate::legal_moves(&after).is_empty() {
            san.push('#');
        } else {
            san.push('+');
        }
    }

    san
}

fn format_piece_move(board: &Board, mv: Move) -> String {
    let mut san = String::new();
    let Some(piece) = board.piece_on(mv.from) else {
        return san;
    };
    let capture = is_capture(board, mv, piece);

    match PieceKind::from(piece).san_letter() {
        Some(letter) => {
            san.push(letter);
            san.push_str(&disambiguation(board, mv, piece));
        }
        None => {
            if capture {
                san.push(mv.from.file().into());
            }
        }
    }

    if capture {
        san.push('x');
    }
    san.push_str(&mv.to.to_string());

    if let Some(promo) = mv.promotion.and_then(|p| PieceKind::from(p).san_letter()) {
        san.push('=');
        san.push(promo);
    }

    san
}

fn is_capture(board: &Board, mv: Move, piece: Piece) -> bool {
    let enemy = !board.side_to_move();
    if board.color_on(mv.to) == Some(enemy) {
        return true;
    }
    // En passant: a pawn changing file onto an empty square
    piece == Piece::Pawn && mv.from.file() != mv.to.file()
}

/// Minimal from-square prefix distinguishing `mv` from other legal moves of
/// the same piece type to the same square.
fn disambiguation(board: &Board, mv: Move, piece: Piece) -> String {
    let rivals: Vec<Square> = crate::legal_moves(board)
        .into_iter()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_on(other.from) == Some(piece)
                && !is_castling(board, *other)
        })
        .map(|other| other.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }

    let file_unique = rivals.iter().all(|sq| sq.file() != mv.from.file());
    let rank_unique = rivals.iter().all(|sq| sq.rank() != mv.from.rank());

    if file_unique {
        mv.from.file().to_string()
    } else if rank_unique {
        mv.from.rank().to_string()
    } else {
        mv.from.to_string()
    }
}

fn find_castle(board: &Board, kingside: bool, san: &str) -> Result<Move, SanError> {
    crate::legal_moves(board)
        .into_iter()
        .find(|&mv| {
            is_castling(board, mv) && ((mv.to.file() as u8 > mv.from.file() as u8) == kingside)
        })
        .ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

/// Decomposed non-castling SAN: `[piece][file][rank][x]square[=promotion]`.
#[derive(Debug)]
struct SanPattern {
    piece: Piece,
    from_file: Option<File>,
    from_rank: Option<Rank>,
    to: Square,
    promotion: Option<Piece>,
}

impl SanPattern {
    fn parse(text: &str) -> Option<Self> {
        let mut chars: Vec<char> = text.chars().collect();

        let piece = match chars.first().copied().and_then(PieceKind::from_san_letter) {
            Some(kind) => {
                chars.remove(0);
                kind.into()
            }
            None => Piece::Pawn,
        };

        let mut promotion = None;
        if let Some(kind) = chars
            .last()
            .copied()
            .filter(char::is_ascii_uppercase)
            .and_then(PieceKind::from_promotion_char)
        {
            chars.pop();
            if chars.last() == Some(&'=') {
                chars.pop();
            }
            promotion = Some(kind.into());
        }

        if chars.len() < 2 {
            return None;
        }
        let rank = Rank::try_from(chars.pop()?).ok()?;
        let file = File::try_from(chars.pop()?).ok()?;
        let to = Square::new(file, rank);

        if chars.last() == Some(&'x') {
            chars.pop();
        }

        let mut from_file = None;
        let mut from_rank = None;
        for c in chars {
            if let Ok(f) = File::try_from(c) {
                if from_file.replace(f).is_some() {
                    return None;
                }
            } else if let Ok(r) = Rank::try_from(c) {
                if from_rank.replace(r).is_some() {
                    return None;
                }
            } else {
                return None;
            }
        }

        Some(Self {
            piece,
            from_file,
            from_rank,
            to,
            promotion,
        })
    }

    fn matches(&self, board: &Board, mv: Move) -> bool {
        mv.to == self.to
            && mv.promotion == self.promotion
            && board.piece_on(mv.from) == Some(self.piece)
            && !is_castling(board, mv)
            && self.from_file.map_or(true, |f| mv.from.file() == f)
            && self.from_rank.map_or(true, |r| mv.from.rank() == r)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fen::parse_fen;

    fn san_roundtrip(fen: &str, san: &str) -> String {
        let board = parse_fen(fen).unwrap();
        let mv = parse_san(&board, san).unwrap();
        format_san(&board, mv)
    }

    #[test]
    fn test_pawn_and_piece_moves() {
        let board = Board::default();
        assert_eq!(format_san(&board, parse_san(&board, "e4").unwrap()), "e4");
        assert_eq!(format_san(&board, parse_san(&board, "Nf3").unwrap()), "Nf3");
    }

    #[test]
    fn test_annotations_and_check_markers_are_ignored() {
        let board = Board::default();
        assert_eq!(parse_san(&board, "e4!?"), parse_san(&board, "e4"));
        assert_eq!(parse_san(&board, "Nf3+"), parse_san(&board, "Nf3"));
    }

    #[test]
    fn test_illegal_move() {
        let board = Board::default();
        assert_eq!(
            parse_san(&board, "e5"),
            Err(SanError::NoLegalMove("e5".to_string()))
        );
        assert!(matches!(
            parse_san(&board, "Zz9"),
            Err(SanError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_castling_both_notations() {
        let fen = "r3k2r/pppppppp/8/8/8/8/PPPPPPPP/R3K2R w KQkq - 0 1";
        assert_eq!(san_roundtrip(fen, "O-O"), "O-O");
        assert_eq!(san_roundtrip(fen, "0-0-0"), "O-O-O");
    }

    #[test]
    fn test_file_disambiguation() {
        // Knights on b1 and f1 can both reach d2
        let fen = "4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1";
        let board = parse_fen(fen).unwrap();
        assert!(matches!(
            parse_san(&board, "Nd2"),
            Err(SanError::AmbiguousMove(_))
        ));
        assert_eq!(san_roundtrip(fen, "Nbd2"), "Nbd2");
        assert_eq!(san_roundtrip(fen, "Nfd2"), "Nfd2");
    }

    #[test]
    fn test_rank_disambiguation() {
        // Rooks on a1 and a5 can both reach a3
        let fen = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_roundtrip(fen, "R1a3"), "R1a3");
        assert_eq!(san_roundtrip(fen, "R5a3"), "R5a3");
    }

    #[test]
    fn test_pawn_capture_and_en_passant() {
        let fen = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2";
        assert_eq!(san_roundtrip(fen, "exd6"), "exd6");
    }

    #[test]
    fn test_promotion_with_and_without_equals() {
        let fen = "7k/P7/8/8/8/8/8/K7 w - - 0 1";
        assert_eq!(san_roundtrip(fen, "a8=Q+"), "a8=Q+");
        assert_eq!(san_roundtrip(fen, "a8Q"), "a8=Q+");
        assert_eq!(san_roundtrip(fen, "a8=N"), "a8=N");
    }

    #[test]
    fn test_checkmate_marker() {
        // Fool's mate, final move
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san_roundtrip(fen, "Qh4"), "Qh4#");
    }
}
