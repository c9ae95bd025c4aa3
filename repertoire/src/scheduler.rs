//! Picks the next line to practice, favouring lines the learner gets wrong
//! or has not seen.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;

use crate::attempt::{AttemptHistory, Outcome};
use crate::lines::{Line, LineId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no lines available in the selected chapters")]
pub struct NoLinesAvailable;

/// Selection weight of a line, from its attempt history. Never zero.
pub fn weight(history: &AttemptHistory, line: &LineId) -> u32 {
    match history.latest_for(line).map(|a| a.outcome) {
        None | Some(Outcome::Failure) => 8,
        Some(Outcome::Abandoned) => 6,
        Some(Outcome::Success) => match history.success_streak(line) {
            0 | 1 => 4,
            2 => 2,
            _ => 1,
        },
    }
}

fn is_eligible(line: &Line, selected: &BTreeSet<String>) -> bool {
    selected.is_empty() || selected.contains(&line.chapter.name)
}

/// Eligible lines with their weights, heaviest first. Equal weights keep the
/// order the lines were given in.
pub fn ranked<'a>(
    lines: &'a [Line],
    history: &AttemptHistory,
    selected: &BTreeSet<String>,
) -> Vec<(&'a Line, u32)> {
    let mut candidates: Vec<(&Line, u32)> = lines
        .iter()
        .filter(|line| is_eligible(line, selected))
        .map(|line| (line, weight(history, &line.id())))
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1));
    candidates
}

/// Weighted random line selection with a reproducible generator.
#[derive(Debug, Clone)]
pub struct Scheduler {
    rng: ChaCha8Rng,
    last: Option<LineId>,
}

impl Scheduler {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            last: None,
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            last: None,
        }
    }

    /// Draw the next line from the chapters in `selected` (all chapters when
    /// empty). The line presented last time is skipped while others remain.
    pub fn next_line<'a>(
        &mut self,
        lines: &'a [Line],
        history: &AttemptHistory,
        selected: &BTreeSet<String>,
    ) -> Result<&'a Line, NoLinesAvailable> {
        let mut candidates: Vec<(&Line, LineId, u32)> = lines
            .iter()
            .filter(|line| is_eligible(line, selected))
            .map(|line| {
                let id = line.id();
                (line, id, weight(history, &id))
            })
            .collect();

        if candidates.len() > 1 {
            if let Some(last) = self.last {
                candidates.retain(|(_, id, _)| *id != last);
            }
        }
        if candidates.is_empty() {
            return Err(NoLinesAvailable);
        }

        let total: u32 = candidates.iter().map(|(_, _, w)| w).sum();
        let mut roll = self.rng.gen_range(0..total);
        let mut picked = candidates.len() - 1;
        for (i, (_, _, w)) in candidates.iter().enumerate() {
            if roll < *w {
                picked = i;
                break;
            }
            roll -= w;
        }

        let (line, id, w) = candidates[picked];
        tracing::debug!(line = %id, weight = w, candidates = candidates.len(), "scheduled line");
        self.last = Some(id);
        Ok(line)
    }
}

/// Carry a chapter selection across a refresh: chapters that still exist
/// keep their state, new chapters start selected, vanished ones drop out.
pub fn reconcile_selection(
    old: &BTreeSet<String>,
    new: &BTreeSet<String>,
    previously_selected: &BTreeSet<String>,
) -> BTreeSet<String> {
    new.iter()
        .filter(|name| !old.contains(*name) || previously_selected.contains(*name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attempt::record_attempt_at;
    use crate::lines::lines_of;
    use crate::pgn::parse;

    const STUDY: &str = "[Event \"Rep: Italian\"]\n1. e4 e5 2. Nf3 Nc6 3. Bc4 (3. Bb5) *\n\
        [Event \"Rep: Sicilian\"]\n1. e4 c5 2. Nf3 *\n";

    fn lines() -> Vec<Line> {
        parse(STUDY).unwrap().iter().flat_map(lines_of).collect()
    }

    fn names(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_weights_follow_history() {
        let lines = lines();
        let line = &lines[0];
        let id = line.id();
        let mut history = AttemptHistory::new();
        assert_eq!(weight(&history, &id), 8);

        record_attempt_at(&mut history, line, Outcome::Success, None, 1);
        assert_eq!(weight(&history, &id), 4);
        record_attempt_at(&mut history, line, Outcome::Success, None, 2);
        assert_eq!(weight(&history, &id), 2);
        record_attempt_at(&mut history, line, Outcome::Success, None, 3);
        assert_eq!(weight(&history, &id), 1);
        record_attempt_at(&mut history, line, Outcome::Abandoned, None, 4);
        assert_eq!(weight(&history, &id), 6);
        record_attempt_at(&mut history, line, Outcome::Failure, Some(2), 5);
        assert_eq!(weight(&history, &id), 8);
    }

    #[test]
    fn test_failed_then_passed_line_stays_schedulable() {
        let lines = lines();
        let only = names(&["Sicilian"]);
        let mut history = AttemptHistory::new();
        for (t, outcome) in [Outcome::Failure, Outcome::Failure, Outcome::Success]
            .into_iter()
            .enumerate()
        {
            record_attempt_at(&mut history, &lines[2], outcome, None, t as u64);
        }

        let mut scheduler = Scheduler::new(7);
        for _ in 0..3 {
            let line = scheduler.next_line(&lines, &history, &only).unwrap();
            assert_eq!(line.id(), lines[2].id());
        }
    }

    #[test]
    fn test_ranked_prefers_weak_lines() {
        let lines = lines();
        let mut history = AttemptHistory::new();
        for t in 0..3 {
            record_attempt_at(&mut history, &lines[0], Outcome::Success, None, t);
        }
        record_attempt_at(&mut history, &lines[1], Outcome::Abandoned, None, 9);

        let ranked: Vec<_> = ranked(&lines, &history, &BTreeSet::new())
            .into_iter()
            .map(|(line, w)| (line.id(), w))
            .collect();
        assert_eq!(
            ranked,
            vec![(lines[2].id(), 8), (lines[1].id(), 6), (lines[0].id(), 1)]
        );
    }

    #[test]
    fn test_selection_filters_chapters() {
        let lines = lines();
        let history = AttemptHistory::new();
        let mut scheduler = Scheduler::new(1);
        for _ in 0..10 {
            let line = scheduler
                .next_line(&lines, &history, &names(&["Italian"]))
                .unwrap();
            assert_eq!(line.chapter.name, "Italian");
        }
        assert_eq!(
            scheduler.next_line(&lines, &history, &names(&["Missing"])),
            Err(NoLinesAvailable)
        );
        assert_eq!(
            scheduler.next_line(&[], &history, &BTreeSet::new()),
            Err(NoLinesAvailable)
        );
    }

    #[test]
    fn test_does_not_repeat_last_line() {
        let lines = lines();
        let history = AttemptHistory::new();
        let mut scheduler = Scheduler::new(3);
        let mut previous = scheduler.next_line(&lines, &history, &BTreeSet::new()).unwrap().id();
        for _ in 0..20 {
            let next = scheduler.next_line(&lines, &history, &BTreeSet::new()).unwrap().id();
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let lines = lines();
        let history = AttemptHistory::new();
        let draw = |seed| {
            let mut scheduler = Scheduler::new(seed);
            (0..10)
                .map(|_| scheduler.next_line(&lines, &history, &BTreeSet::new()).unwrap().id())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(42), draw(42));
    }

    #[test]
    fn test_reconcile_selection() {
        let old = names(&["A", "B", "C"]);
        let new = names(&["A", "B", "D"]);
        let selected = names(&["A"]);
        assert_eq!(reconcile_selection(&old, &new, &selected), names(&["A", "D"]));
        assert_eq!(reconcile_selection(&BTreeSet::new(), &new, &BTreeSet::new()), new);
    }
}
