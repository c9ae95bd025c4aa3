//! PGN tokenizer.
//!
//! Produces only the tokens the tree builder cares about. Comments, NAGs,
//! move numbers, escape lines and stand-alone annotation glyphs are consumed
//! here so they can never desynchronise the movetext.

use super::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Tag { key: String, value: String },
    Move(String),
    VariationStart,
    VariationEnd,
    /// Game termination marker: `1-0`, `0-1`, `1/2-1/2` or `*`.
    Result(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character of the token.
    pub offset: usize,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            failed: false,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.bytes()[self.pos - 1] == b'\n'
    }

    fn skip_line(&mut self) {
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn skip_comment(&mut self, start: usize) -> Result<(), ParseError> {
        match self.bytes()[self.pos..].iter().position(|&b| b == b'}') {
            Some(len) => {
                self.pos += len + 1;
                Ok(())
            }
            None => Err(ParseError::new(start, ParseErrorKind::UnterminatedComment)),
        }
    }

    fn read_tag(&mut self, start: usize) -> Result<TokenKind, ParseError> {
        let malformed = || ParseError::new(start, ParseErrorKind::MalformedTag);

        self.pos += 1; // '['
        self.skip_whitespace();
        let key_start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        if self.pos == key_start {
            return Err(malformed());
        }
        let key = self.src[key_start..self.pos].to_string();

        self.skip_whitespace();
        if self.peek() != Some(b'"') {
            return Err(malformed());
        }
        self.pos += 1;

        let mut value = Vec::new();
        loop {
            match self.peek() {
                None => return Err(malformed()),
                Some(b'"') => {
                    self.pos += 1;
                    break;
                }
                Some(b'\\') => {
                    let escaped = self.bytes().get(self.pos + 1).copied().ok_or_else(malformed)?;
                    value.push(escaped);
                    self.pos += 2;
                }
                Some(b) => {
                    value.push(b);
                    self.pos += 1;
                }
            }
        }

        self.skip_whitespace();
        if self.peek() != Some(b']') {
            return Err(malformed());
        }
        self.pos += 1;

        let value = String::from_utf8(value).map_err(|_| malformed())?;
        Ok(TokenKind::Tag { key, value })
    }

    fn read_symbol(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|b| !is_delimiter(b)) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn next_token(&mut self) -> Option<Result<Token, ParseError>> {
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let b = self.peek()?;

            let kind = match b {
                b'%' if self.at_line_start() => {
                    self.skip_line();
                    continue;
                }
                b';' => {
                    self.skip_line();
                    continue;
                }
                b'{' => {
                    if let Err(e) = self.skip_comment(start) {
                        return Some(Err(e));
                    }
                    continue;
                }
                b'$' => {
                    self.pos += 1;
                    while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                        self.pos += 1;
                    }
                    continue;
                }
                b'[' => match self.read_tag(start) {
                    Ok(kind) => kind,
                    Err(e) => return Some(Err(e)),
                },
                b'(' => {
                    self.pos += 1;
                    TokenKind::VariationStart
                }
                b')' => {
                    self.pos += 1;
                    TokenKind::VariationEnd
                }
                b'}' | b']' => {
                    self.pos += 1;
                    return Some(Err(ParseError::new(
                        start,
                        ParseErrorKind::UnexpectedToken((b as char).to_string()),
                    )));
                }
                _ => match classify_symbol(self.read_symbol()) {
                    Ok(Some(kind)) => kind,
                    Ok(None) => continue,
                    Err(reason) => return Some(Err(ParseError::new(start, reason))),
                },
            };

            return Some(Ok(Token {
                kind,
                offset: start,
            }));
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, ParseError>;

    /// Yields tokens until the input ends or the first error; nothing after
    /// an error is reliable, so iteration stops there.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Some(Err(_))) {
            self.failed = true;
        }
        item
    }
}

fn is_delimiter(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'(' | b')' | b'{' | b'}' | b'[' | b']' | b';' | b'$')
}

/// Turn a bare movetext symbol into a token, or `None` for symbols that carry
/// no tree semantics (move numbers, evaluation glyphs like `+-` or `!?`).
/// Null moves are rejected: skipping one would hand the turn to the wrong side.
fn classify_symbol(symbol: &str) -> Result<Option<TokenKind>, ParseErrorKind> {
    match symbol {
        "1-0" | "0-1" | "1/2-1/2" | "*" => return Ok(Some(TokenKind::Result(symbol.to_string()))),
        _ => {}
    }

    // "12." / "12..." are move numbers; "12.e4" glues the number to a move
    let after_number = symbol.trim_start_matches(|c: char| c.is_ascii_digit());
    let mv = if after_number.len() != symbol.len() {
        if !after_number.starts_with('.') && !after_number.is_empty() {
            // Digits run into the move itself, as in "0-0"
            return Ok(Some(TokenKind::Move(symbol.to_string())));
        }
        after_number.trim_start_matches('.')
    } else {
        symbol.trim_start_matches('.')
    };

    let bare = chess::san::strip_suffixes(mv);
    if matches!(bare, "0-0" | "0-0-0") {
        return Ok(Some(TokenKind::Move(mv.to_string())));
    }
    if bare == "--" {
        return Err(ParseErrorKind::UnexpectedToken(mv.to_string()));
    }

    if mv.bytes().any(|b| b.is_ascii_alphabetic()) {
        Ok(Some(TokenKind::Move(mv.to_string())))
    } else {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).map(|t| t.unwrap().kind).collect()
    }

    fn mv(s: &str) -> TokenKind {
        TokenKind::Move(s.to_string())
    }

    #[test]
    fn test_tags_and_moves() {
        let tokens = kinds("[Event \"Test: One\"]\n\n1. e4 e5 2. Nf3 *");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Tag {
                    key: "Event".into(),
                    value: "Test: One".into()
                },
                mv("e4"),
                mv("e5"),
                mv("Nf3"),
                TokenKind::Result("*".into()),
            ]
        );
    }

    #[test]
    fn test_discards_annotations() {
        let tokens = kinds(
            "1. e4 { [%clk 0:05:00] best by test } e5!? $1 2. Nf3 ; rest of line\n Nc6 +- 3... a6",
        );
        assert_eq!(tokens, vec![mv("e4"), mv("e5!?"), mv("Nf3"), mv("Nc6"), mv("a6")]);
    }

    #[test]
    fn test_variations_and_glued_numbers() {
        let tokens = kinds("1.e4 e5 (1...c5 2.Nf3) 2.Nf3");
        assert_eq!(
            tokens,
            vec![
                mv("e4"),
                mv("e5"),
                TokenKind::VariationStart,
                mv("c5"),
                mv("Nf3"),
                TokenKind::VariationEnd,
                mv("Nf3"),
            ]
        );
    }

    #[test]
    fn test_results_and_zero_castling() {
        let tokens = kinds("5. 0-0 0-0-0+ 1/2-1/2 1-0 0-1");
        assert_eq!(
            tokens,
            vec![
                mv("0-0"),
                mv("0-0-0+"),
                TokenKind::Result("1/2-1/2".into()),
                TokenKind::Result("1-0".into()),
                TokenKind::Result("0-1".into()),
            ]
        );
    }

    #[test]
    fn test_zero_castling_glued_to_move_number() {
        let tokens = kinds("4.0-0 Nf6 7...0-0-0 12.0-0+");
        assert_eq!(tokens, vec![mv("0-0"), mv("Nf6"), mv("0-0-0"), mv("0-0+")]);
    }

    #[test]
    fn test_null_move_is_rejected() {
        let src = "1. e4 -- 2. d4";
        let results: Vec<_> = Lexer::new(src).collect();
        assert_eq!(
            results.last(),
            Some(&Err(ParseError::new(
                src.find("--").unwrap(),
                ParseErrorKind::UnexpectedToken("--".into())
            )))
        );

        let results: Vec<_> = Lexer::new("1. e4 e5 2...--").collect();
        assert!(matches!(
            results.last(),
            Some(Err(ParseError { reason: ParseErrorKind::UnexpectedToken(_), .. }))
        ));
    }

    #[test]
    fn test_escape_lines_and_tag_escapes() {
        let tokens = kinds("% generated file\n[Annotator \"A \\\"quoted\\\" name\"]");
        assert_eq!(
            tokens,
            vec![TokenKind::Tag {
                key: "Annotator".into(),
                value: "A \"quoted\" name".into()
            }]
        );
    }

    #[test]
    fn test_offsets_survive_comments() {
        let src = "1. e4 {a comment} e5";
        let tokens: Vec<Token> = Lexer::new(src).map(Result::unwrap).collect();
        assert_eq!(tokens[1].offset, src.find("e5").unwrap());
    }

    #[test]
    fn test_unterminated_comment() {
        let results: Vec<_> = Lexer::new("1. e4 { never closed").collect();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1],
            Err(ParseError::new(6, ParseErrorKind::UnterminatedComment))
        );
    }

    #[test]
    fn test_malformed_tag() {
        let results: Vec<_> = Lexer::new("[Event missing quotes]").collect();
        assert_eq!(
            results,
            vec![Err(ParseError::new(0, ParseErrorKind::MalformedTag))]
        );
    }
}
