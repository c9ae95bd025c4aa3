//! Progress of a learner through one line.

use chess::san::strip_suffixes;
use chess::{Move, PieceColor};
use serde::{Deserialize, Serialize};

use crate::attempt::Outcome;
use crate::lines::{side_at, Line};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStatus {
    NotStarted,
    InProgress,
    /// The move just played matched the line.
    Correct,
    Incorrect,
    Complete,
}

impl LineStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, LineStatus::Complete | LineStatus::Incorrect)
    }
}

/// Classify progress through a line of `line_len` moves after `line_index`
/// moves were played, given the index of the first wrong move if any.
pub fn status(line_len: usize, line_index: usize, deviation: Option<usize>) -> LineStatus {
    match deviation {
        Some(at) if at <= line_index => LineStatus::Incorrect,
        _ if line_index >= line_len => LineStatus::Complete,
        _ if line_index == 0 => LineStatus::NotStarted,
        _ => LineStatus::InProgress,
    }
}

/// A learner practicing one line: the learner plays their side's moves and
/// the opponent's replies are played from the line.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    line: Line,
    learner: PieceColor,
    line_index: usize,
    deviation: Option<usize>,
}

impl PracticeSession {
    pub fn new(line: Line, learner: PieceColor) -> Self {
        Self {
            line,
            learner,
            line_index: 0,
            deviation: None,
        }
    }

    pub fn line(&self) -> &Line {
        &self.line
    }

    pub fn line_index(&self) -> usize {
        self.line_index
    }

    pub fn deviation(&self) -> Option<usize> {
        self.deviation
    }

    pub fn status(&self) -> LineStatus {
        status(self.line.len(), self.line_index, self.deviation)
    }

    /// The move the line plays next, if the session is still running.
    pub fn expected(&self) -> Option<&Move> {
        if self.status().is_finished() {
            return None;
        }
        self.line.moves.get(self.line_index)
    }

    pub fn is_learner_turn(&self) -> bool {
        self.expected().is_some() && side_at(&self.line, self.line_index) == self.learner
    }

    /// Play the opponent's scripted reply. Returns `None` when it is the
    /// learner's turn or the session is over.
    pub fn auto_play(&mut self) -> Option<Move> {
        if self.is_learner_turn() {
            return None;
        }
        let mv = self.expected()?.clone();
        self.line_index += 1;
        Some(mv)
    }

    /// Check the learner's move against the line. Input may be SAN, with or
    /// without check and annotation marks, or UCI.
    pub fn play(&mut self, input: &str) -> LineStatus {
        let Some(expected) = self.expected() else {
            return self.status();
        };

        if matches_move(expected, input) {
            self.line_index += 1;
            match self.status() {
                LineStatus::Complete => LineStatus::Complete,
                _ => LineStatus::Correct,
            }
        } else {
            self.deviation.get_or_insert(self.line_index);
            LineStatus::Incorrect
        }
    }

    /// How the session ended, for the attempt log.
    pub fn outcome(&self) -> Outcome {
        match self.status() {
            LineStatus::Incorrect => Outcome::Failure,
            LineStatus::Complete => Outcome::Success,
            _ => Outcome::Abandoned,
        }
    }
}

fn matches_move(expected: &Move, input: &str) -> bool {
    let input = input.trim();
    let san = if input.starts_with("0-0") {
        input.replace('0', "O")
    } else {
        input.to_string()
    };
    strip_suffixes(&san) == strip_suffixes(&expected.san) || input.eq_ignore_ascii_case(&expected.uci)
}
