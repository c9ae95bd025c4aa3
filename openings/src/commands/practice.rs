//! Interactive practice loop.

use anyhow::Context;
use chess::PieceColor;
use repertoire::{
    record_attempt, AttemptHistory, Chapter, LineStatus, NoLinesAvailable, Outcome,
    PracticeSession, RefreshOutcome, Scheduler, Study,
};
use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use super::load_chapters;
use crate::persistence::AttemptStore;

pub struct PracticeOptions {
    pub pgn: PathBuf,
    /// Chapter names to practice; empty means all.
    pub chapters: BTreeSet<String>,
    pub seed: Option<u64>,
    /// Stop after this many lines.
    pub rounds: Option<usize>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct PracticeSummary {
    pub success: usize,
    pub failure: usize,
    pub abandoned: usize,
}

impl PracticeSummary {
    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success => self.success += 1,
            Outcome::Failure => self.failure += 1,
            Outcome::Abandoned => self.abandoned += 1,
        }
    }

    pub fn rounds(&self) -> usize {
        self.success + self.failure + self.abandoned
    }
}

enum Input {
    Move(String),
    Refresh,
    Quit,
}

fn read_input(input: &mut impl BufRead) -> anyhow::Result<Input> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Input::Quit);
    }
    Ok(match line.trim() {
        "q" | "quit" => Input::Quit,
        "r" | "refresh" => Input::Refresh,
        mv => Input::Move(mv.to_string()),
    })
}

fn move_label(session: &PracticeSession, index: usize, san: &str) -> String {
    let line = session.line();
    let black_first = line.start_fen.split_whitespace().nth(1) == Some("b");
    let start: usize = line
        .start_fen
        .split_whitespace()
        .nth(5)
        .and_then(|n| n.parse().ok())
        .unwrap_or(1);
    let ply = index + usize::from(black_first);
    let number = start + ply / 2;
    if ply % 2 == 0 {
        format!("{}. {}", number, san)
    } else {
        format!("{}... {}", number, san)
    }
}

fn refresh(study: &mut Study, options: &PracticeOptions, out: &mut impl Write) -> anyhow::Result<()> {
    let ticket = study.begin_refresh();
    let chapters = load_chapters(&options.pgn)?;
    match study.apply_refresh(ticket, chapters) {
        RefreshOutcome::Applied => writeln!(
            out,
            "Reloaded {} chapters ({} selected)",
            study.chapters().len(),
            study.selected().len()
        )?,
        RefreshOutcome::Stale => writeln!(out, "A newer reload already applied")?,
    }
    Ok(())
}

/// Run practice rounds until the learner quits, input ends, or the round
/// limit is reached. Every finished or abandoned line is recorded.
pub fn run(
    options: &PracticeOptions,
    store: &AttemptStore,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> anyhow::Result<PracticeSummary> {
    let mut study = Study::new(load_chapters(&options.pgn)?);
    if !options.chapters.is_empty() {
        let names: Vec<String> = study.chapters().iter().map(|c| c.name.clone()).collect();
        for name in names {
            study.set_selected(&name, options.chapters.contains(&name));
        }
        for missing in options.chapters.iter().filter(|n| study.chapter(n).is_none()) {
            tracing::warn!("No chapter named {:?}", missing);
        }
    }

    let mut history: AttemptHistory = store.load_history().context("failed to load attempts")?;
    let mut scheduler = match options.seed {
        Some(seed) => Scheduler::new(seed),
        None => Scheduler::from_entropy(),
    };
    let mut summary = PracticeSummary::default();

    'rounds: while options.rounds.map_or(true, |limit| summary.rounds() < limit) {
        // Already restricted to the study's selection, which may be empty
        let lines = study.selected_lines();
        let line = match scheduler.next_line(&lines, &history, &BTreeSet::new()) {
            Ok(line) => line.clone(),
            Err(NoLinesAvailable) => {
                writeln!(out, "No lines to practice in the selected chapters")?;
                break;
            }
        };
        let chapter: Option<Chapter> = study.chapter(&line.chapter.name).cloned();
        let learner = chapter
            .as_ref()
            .map(Chapter::orientation)
            .unwrap_or(PieceColor::White);

        writeln!(out, "\n{} (you play {})", line.chapter, learner)?;
        let mut session = PracticeSession::new(line, learner);
        let mut quit = false;

        while !session.status().is_finished() {
            while let Some(mv) = session.auto_play() {
                let label = move_label(&session, session.line_index() - 1, &mv.san);
                writeln!(out, "  {}", label)?;
            }
            if session.status().is_finished() {
                break;
            }

            write!(out, "> ")?;
            out.flush()?;
            let played = match read_input(input)? {
                Input::Move(mv) => mv,
                Input::Refresh => {
                    refresh(&mut study, options, out)?;
                    continue;
                }
                Input::Quit => {
                    quit = true;
                    break;
                }
            };

            let index = session.line_index();
            match session.play(&played) {
                LineStatus::Correct => writeln!(out, "  correct")?,
                LineStatus::Complete => writeln!(out, "  line complete")?,
                _ => {
                    let expected = session
                        .line()
                        .moves
                        .get(index)
                        .map(|m| move_label(&session, index, &m.san))
                        .unwrap_or_default();
                    writeln!(out, "  wrong, the line plays {}", expected)?;
                    if let Some(link) = chapter.as_ref().and_then(|c| c.link_to_ply(index)) {
                        writeln!(out, "  review: {}", link)?;
                    }
                }
            }
        }

        let outcome = session.outcome();
        let attempt = record_attempt(&mut history, session.line(), outcome, session.deviation());
        store.save(&attempt).context("failed to save attempt")?;
        summary.count(outcome);
        tracing::info!(line = %attempt.line_id, %outcome, "attempt saved");

        if quit {
            break 'rounds;
        }
    }

    writeln!(
        out,
        "\n{} lines: {} passed, {} failed, {} abandoned",
        summary.rounds(),
        summary.success,
        summary.failure,
        summary.abandoned
    )?;
    Ok(summary)
}
