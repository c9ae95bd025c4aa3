//! Append-only record of practice attempts.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::chapter::ChapterKey;
use crate::lines::{Line, LineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Abandoned,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Abandoned => "abandoned",
        })
    }
}

/// One completed, failed or abandoned run through a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub attempt_id: Uuid,
    pub line_id: LineId,
    pub chapter: ChapterKey,
    /// Unix seconds.
    pub timestamp: u64,
    /// Position among the attempts of the same line, from zero. Orders
    /// attempts recorded within the same second.
    #[serde(default)]
    pub seq: u64,
    pub outcome: Outcome,
    /// Index of the first wrong move, for failures.
    pub deviation_index: Option<usize>,
}

/// Attempts grouped by line, oldest first.
#[derive(Debug, Clone, Default)]
pub struct AttemptHistory {
    by_line: HashMap<LineId, Vec<Attempt>>,
    len: usize,
}

impl AttemptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from stored attempts in any order.
    pub fn from_attempts(attempts: impl IntoIterator<Item = Attempt>) -> Self {
        let mut attempts: Vec<Attempt> = attempts.into_iter().collect();
        attempts.sort_by_key(|a| (a.timestamp, a.seq));

        let mut history = Self::new();
        for attempt in attempts {
            history.push(attempt);
        }
        history
    }

    pub fn push(&mut self, attempt: Attempt) {
        self.by_line.entry(attempt.line_id).or_default().push(attempt);
        self.len += 1;
    }

    pub fn attempts_for(&self, line: &LineId) -> &[Attempt] {
        self.by_line.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn latest_for(&self, line: &LineId) -> Option<&Attempt> {
        self.attempts_for(line).last()
    }

    /// Successes in a row, counted back from the latest attempt.
    pub fn success_streak(&self, line: &LineId) -> usize {
        self.attempts_for(line)
            .iter()
            .rev()
            .take_while(|a| a.outcome == Outcome::Success)
            .count()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every attempt, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Attempt> {
        let mut all: Vec<&Attempt> = self.by_line.values().flatten().collect();
        all.sort_by_key(|a| (a.timestamp, a.seq));
        all.into_iter()
    }
}

pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Record the result of practicing `line` now.
pub fn record_attempt(
    history: &mut AttemptHistory,
    line: &Line,
    outcome: Outcome,
    deviation_index: Option<usize>,
) -> Attempt {
    record_attempt_at(history, line, outcome, deviation_index, now_timestamp())
}

pub fn record_attempt_at(
    history: &mut AttemptHistory,
    line: &Line,
    outcome: Outcome,
    deviation_index: Option<usize>,
    timestamp: u64,
) -> Attempt {
    let line_id = line.id();
    let attempt = Attempt {
        attempt_id: Uuid::new_v4(),
        line_id,
        chapter: line.chapter.clone(),
        timestamp,
        seq: history.attempts_for(&line_id).len() as u64,
        outcome,
        deviation_index,
    };
    tracing::debug!(line = %attempt.line_id, outcome = %outcome, "recorded attempt");
    history.push(attempt.clone());
    attempt
}
