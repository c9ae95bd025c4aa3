//! Root-to-leaf lines of a chapter tree, and lookups by position.

use chess::fen::position_key;
use chess::{IllegalMoveError, Move, PieceColor, Position, Rules};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::chapter::{Chapter, ChapterKey};
use crate::tree::PositionNode;

/// Stable identity of a line: derived from its chapter and move sequence, so
/// it survives re-parsing the same study.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(Uuid);

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for LineId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(LineId)
    }
}

/// The moves from a chapter's root to one of its leaves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub moves: Vec<Move>,
    pub chapter: ChapterKey,
    pub start_fen: String,
    pub leaf_fen: String,
}

impl Line {
    pub fn id(&self) -> LineId {
        let mut name = format!("{}\u{1f}{}", self.chapter.study, self.chapter.name);
        for mv in &self.moves {
            name.push('\u{1f}');
            name.push_str(&mv.uci);
        }
        LineId(Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()))
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Numbered SAN, e.g. `1. e4 e5 2. Nf3`, or `3... Nf6` when the line
    /// starts with black to move.
    pub fn movetext(&self) -> String {
        let mut fields = self.start_fen.split_whitespace().skip(1);
        let mut black = fields.next() == Some("b");
        let mut number: u32 = fields
            .nth(3)
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);

        let mut out = String::new();
        for (i, mv) in self.moves.iter().enumerate() {
            if !out.is_empty() {
                out.push(' ');
            }
            if !black {
                out.push_str(&format!("{}. ", number));
            } else if i == 0 {
                out.push_str(&format!("{}... ", number));
            }
            out.push_str(&mv.san);
            if black {
                number += 1;
            }
            black = !black;
        }
        out
    }
}

/// Every root-to-leaf line of the chapter, main line first and then in
/// source order of the alternatives. A chapter without moves has no lines.
pub fn lines_of(chapter: &Chapter) -> Vec<Line> {
    let root = &chapter.position_tree;
    let key = chapter.key();
    let start_fen = root.position.fen().to_string();

    let mut lines = Vec::new();
    let mut moves: Vec<Move> = Vec::new();
    let mut stack: Vec<(&PositionNode, usize)> =
        root.children.iter().rev().map(|child| (child, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        moves.truncate(depth);
        if let Some(mv) = node.position.last_move() {
            moves.push(mv.clone());
        }

        if node.is_leaf() {
            lines.push(Line {
                moves: moves.clone(),
                chapter: key.clone(),
                start_fen: start_fen.clone(),
                leaf_fen: node.position.fen().to_string(),
            });
        } else {
            stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
    }

    lines
}

/// The moves leading from the chapter root to the first node (in pre-order)
/// whose board matches `fen`. Move counters are ignored. The root itself
/// yields an empty path.
pub fn find_path_to_position(chapter: &Chapter, fen: &str) -> Option<Vec<Move>> {
    let target = position_key(fen);
    let mut path: Vec<Move> = Vec::new();
    let mut stack = vec![(&chapter.position_tree, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        path.truncate(depth.saturating_sub(1));
        if let Some(mv) = node.position.last_move() {
            path.push(mv.clone());
        }

        if node.position.key() == target {
            return Some(path);
        }
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }

    None
}

/// Play the line's moves from its start position.
pub fn replay<R: Rules>(line: &Line, rules: &R) -> Result<Position, IllegalMoveError> {
    let start = rules.start_position(Some(&line.start_fen))?;
    line.moves
        .iter()
        .try_fold(start, |position, mv| rules.apply_move(&position, &mv.uci))
}

/// Replay a line and check it lands on its leaf.
///
/// # Panics
///
/// If the moves do not replay, or replay to a different position. Lines come
/// straight from a parsed tree, so either means the tree was built wrong.
pub fn verify_line<R: Rules>(line: &Line, rules: &R) -> Position {
    match replay(line, rules) {
        Ok(position) if position.fen() == line.leaf_fen => position,
        Ok(position) => panic!(
            "line {} replays to {} instead of {}",
            line.movetext(),
            position.fen(),
            line.leaf_fen
        ),
        Err(err) => panic!("line {} does not replay: {}", line.movetext(), err),
    }
}

/// Whose move it is at `index` into the line.
pub fn side_at(line: &Line, index: usize) -> PieceColor {
    let first = if line.start_fen.split_whitespace().nth(1) == Some("b") {
        PieceColor::Black
    } else {
        PieceColor::White
    };
    if index % 2 == 0 {
        first
    } else {
        first.opposite()
    }
}
