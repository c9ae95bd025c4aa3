use chess::{Rules, StandardRules};
use std::collections::BTreeMap;

use super::lexer::{Lexer, Token, TokenKind};
use super::{ParseError, ParseErrorKind};
use crate::chapter::Chapter;
use crate::tree::PositionNode;

/// Builds one chapter tree per PGN game, applying moves through a [`Rules`]
/// implementation.
#[derive(Debug, Clone, Default)]
pub struct PgnParser<R = StandardRules> {
    rules: R,
}

impl PgnParser {
    pub fn new() -> Self {
        Self {
            rules: StandardRules,
        }
    }
}

impl<R: Rules> PgnParser<R> {
    pub fn with_rules(rules: R) -> Self {
        Self { rules }
    }

    /// Parse all games, failing on the first one that is malformed.
    pub fn parse(&self, text: &str) -> Result<Vec<Chapter>, ParseError> {
        self.parse_each(text).into_iter().collect()
    }

    /// Parse all games, keeping each game's outcome separate.
    ///
    /// A tokenizer error ends the document: everything after it is
    /// unreadable, so it becomes the final entry.
    pub fn parse_each(&self, text: &str) -> Vec<Result<Chapter, ParseError>> {
        let mut results = Vec::new();
        let mut current: Option<GameBuilder> = None;

        for token in Lexer::new(text) {
            let token = match token {
                Ok(token) => token,
                Err(err) => {
                    let failed = match current.take() {
                        Some(mut game) => {
                            game.fail(err);
                            game.finish(&self.rules, results.len())
                        }
                        None => Err(err),
                    };
                    results.push(failed);
                    return results;
                }
            };

            match token.kind {
                TokenKind::Tag { key, value } => {
                    if current.as_ref().is_some_and(|g| g.in_movetext) {
                        if let Some(game) = current.take() {
                            results.push(game.finish(&self.rules, results.len()));
                        }
                    }
                    current
                        .get_or_insert_with(GameBuilder::default)
                        .add_tag(key, value, token.offset);
                }
                TokenKind::Result(_) => match current.take() {
                    Some(game) => results.push(game.finish(&self.rules, results.len())),
                    None => results.push(Err(ParseError::new(
                        token.offset,
                        ParseErrorKind::MissingTagPairs,
                    ))),
                },
                kind => {
                    let offset = token.offset;
                    let game = current.get_or_insert_with(|| {
                        let mut orphan = GameBuilder::default();
                        orphan.fail(ParseError::new(offset, ParseErrorKind::MissingTagPairs));
                        orphan
                    });
                    game.movetext(&self.rules, Token { kind, offset });
                }
            }
        }

        if let Some(game) = current.take() {
            results.push(game.finish(&self.rules, results.len()));
        }
        results
    }
}

/// Accumulates one game while its tokens stream in.
#[derive(Debug, Default)]
struct GameBuilder {
    headers: BTreeMap<String, String>,
    fen_offset: usize,
    root: Option<PositionNode>,
    /// Child indices from the root to the node the next move is played from.
    cursor: Vec<usize>,
    /// Saved cursors of open variations, with the offset of their '('.
    variations: Vec<(Vec<usize>, usize)>,
    in_movetext: bool,
    error: Option<ParseError>,
}

impl GameBuilder {
    fn add_tag(&mut self, key: String, value: String, offset: usize) {
        if key == "FEN" {
            self.fen_offset = offset;
        }
        self.headers.insert(key, value);
    }

    fn fail(&mut self, err: ParseError) {
        self.error.get_or_insert(err);
    }

    fn movetext<R: Rules>(&mut self, rules: &R, token: Token) {
        self.in_movetext = true;
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.apply(rules, token) {
            self.fail(err);
        }
    }

    fn apply<R: Rules>(&mut self, rules: &R, token: Token) -> Result<(), ParseError> {
        let offset = token.offset;
        match token.kind {
            TokenKind::Move(text) => self.play(rules, &text, offset),
            TokenKind::VariationStart => {
                if self.cursor.is_empty() {
                    return Err(ParseError::new(offset, ParseErrorKind::VariationWithoutMove));
                }
                self.variations.push((self.cursor.clone(), offset));
                // The variation replaces the move just played
                self.cursor.pop();
                Ok(())
            }
            TokenKind::VariationEnd => {
                let (saved, _) = self
                    .variations
                    .pop()
                    .ok_or_else(|| ParseError::new(offset, ParseErrorKind::UnmatchedVariationEnd))?;
                self.cursor = saved;
                Ok(())
            }
            TokenKind::Tag { .. } | TokenKind::Result(_) => Err(ParseError::new(
                offset,
                ParseErrorKind::UnexpectedToken("tag or result inside movetext".to_string()),
            )),
        }
    }

    /// The tree root, created from the `FEN` tag on first use.
    fn root_mut<R: Rules>(&mut self, rules: &R) -> Result<&mut PositionNode, ParseError> {
        let root = match self.root.take() {
            Some(root) => root,
            None => self.start_node(rules)?,
        };
        Ok(self.root.insert(root))
    }

    fn start_node<R: Rules>(&self, rules: &R) -> Result<PositionNode, ParseError> {
        rules
            .start_position(self.headers.get("FEN").map(String::as_str))
            .map(PositionNode::new)
            .map_err(|e| ParseError::new(self.fen_offset, ParseErrorKind::InvalidFen(e.to_string())))
    }

    fn play<R: Rules>(&mut self, rules: &R, text: &str, offset: usize) -> Result<(), ParseError> {
        let cursor = self.cursor.clone();
        let node = self
            .root_mut(rules)?
            .node_at_mut(&cursor)
            .ok_or_else(|| ParseError::new(offset, ParseErrorKind::UnexpectedToken(text.to_string())))?;

        let next = rules
            .apply_move(&node.position, text)
            .map_err(|e| ParseError::new(offset, ParseErrorKind::IllegalMove(e)))?;

        let existing = next
            .last_move()
            .and_then(|mv| node.child_for(&mv.uci));
        let index = match existing {
            Some(index) => index,
            None => {
                node.children.push(PositionNode::new(next));
                node.children.len() - 1
            }
        };

        self.cursor.push(index);
        Ok(())
    }

    fn finish<R: Rules>(mut self, rules: &R, index: usize) -> Result<Chapter, ParseError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        if let Some(&(_, offset)) = self.variations.last() {
            return Err(ParseError::new(offset, ParseErrorKind::UnterminatedVariation));
        }

        let root = match self.root.take() {
            Some(root) => root,
            None => self.start_node(rules)?,
        };

        let chapter = Chapter::from_headers(self.headers, root, index);
        tracing::debug!(
            chapter = %chapter.key(),
            nodes = chapter.position_tree.node_count(),
            leaves = chapter.position_tree.leaf_count(),
            "parsed chapter"
        );
        Ok(chapter)
    }
}
