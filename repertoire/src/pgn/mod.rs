//! PGN text to chapter trees.

mod lexer;
mod parser;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::PgnParser;

use chess::IllegalMoveError;

use crate::chapter::Chapter;

/// Parse every game in `text` with standard chess rules, failing on the
/// first malformed game.
pub fn parse(text: &str) -> Result<Vec<Chapter>, ParseError> {
    PgnParser::new().parse(text)
}

/// Parse every game in `text` independently; a malformed game yields an
/// error in its slot without preventing the games around it.
pub fn parse_each(text: &str) -> Vec<Result<Chapter, ParseError>> {
    PgnParser::new().parse_each(text)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("PGN error at byte {offset}: {reason}")]
pub struct ParseError {
    /// Byte offset into the source text.
    pub offset: usize,
    pub reason: ParseErrorKind,
}

impl ParseError {
    pub fn new(offset: usize, reason: ParseErrorKind) -> Self {
        Self { offset, reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("variation is never closed")]
    UnterminatedVariation,
    #[error("')' without a matching '('")]
    UnmatchedVariationEnd,
    #[error("variation opened before any move")]
    VariationWithoutMove,
    #[error("{0}")]
    IllegalMove(IllegalMoveError),
    #[error("movetext without tag pairs")]
    MissingTagPairs,
    #[error("comment is never closed")]
    UnterminatedComment,
    #[error("malformed tag pair")]
    MalformedTag,
    #[error("invalid FEN tag: {0}")]
    InvalidFen(String),
    #[error("unexpected {0:?}")]
    UnexpectedToken(String),
}
