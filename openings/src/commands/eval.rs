//! Engine evaluation of positions and repertoire lines.

use anyhow::Context;
use chess::{AnalysisScore, EvaluatedPosition, Rules, StandardRules};
use engine::{EngineConfig, StockfishEngine};
use repertoire::{lines_of, Chapter, EvaluationCache};
use std::collections::BTreeSet;
use std::io::Write;

/// A position to evaluate and how to label it in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub label: String,
    pub fen: String,
}

/// The leaf of every selected line, labelled with its moves.
pub fn line_targets(chapters: &[Chapter], selected: &BTreeSet<String>) -> Vec<Target> {
    chapters
        .iter()
        .filter(|c| selected.is_empty() || selected.contains(&c.name))
        .flat_map(lines_of)
        .map(|line| Target {
            label: format!("{}: {}", line.chapter.name, line.movetext()),
            fen: line.leaf_fen,
        })
        .collect()
}

pub fn fen_target(fen: &str) -> anyhow::Result<Target> {
    let position = StandardRules
        .start_position(Some(fen))
        .with_context(|| format!("invalid FEN {:?}", fen))?;
    Ok(Target {
        label: position.fen().to_string(),
        fen: position.fen().to_string(),
    })
}

/// Score from white's point of view; engines report the side to move.
pub fn white_pov(eval: &EvaluatedPosition) -> AnalysisScore {
    if eval.fen.split_whitespace().nth(1) == Some("b") {
        eval.score.negate()
    } else {
        eval.score
    }
}

fn describe(eval: &EvaluatedPosition) -> String {
    match &eval.best_move {
        Some(best) => format!("{} (depth {}, best {})", white_pov(eval), eval.depth, best),
        None => format!("{} (depth {})", white_pov(eval), eval.depth),
    }
}

/// Evaluate each target, reusing cached results deep enough for `depth`.
/// The engine is only started when some target is not cached.
pub async fn run(
    targets: &[Target],
    depth: u32,
    engine_config: EngineConfig,
    cache: &mut EvaluationCache,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut pending = Vec::new();
    for target in targets {
        match cache.get_at_depth(&target.fen, depth) {
            Some(cached) => writeln!(out, "{}  {}  [cached]", describe(cached), target.label)?,
            None => pending.push(target),
        }
    }
    if pending.is_empty() {
        return Ok(());
    }

    let engine = StockfishEngine::spawn(engine_config)
        .await
        .context("failed to start the engine")?;

    for target in pending {
        // Repeated positions are answered by the first search
        if let Some(cached) = cache.get_at_depth(&target.fen, depth) {
            writeln!(out, "{}  {}  [cached]", describe(cached), target.label)?;
            continue;
        }

        let mut updates = engine.evaluate(&target.fen, depth).await?;
        let mut last = None;
        while let Some(eval) = updates.recv().await {
            tracing::debug!(depth = eval.depth, score = %eval.score, "evaluation update");
            cache.put(eval.clone());
            last = Some(eval);
        }

        match last {
            Some(eval) => writeln!(out, "{}  {}", describe(&eval), target.label)?,
            None => writeln!(out, "no evaluation  {}", target.label)?,
        }
    }

    engine.shutdown().await;
    tracing::info!(cached = cache.len(), "evaluation finished");
    Ok(())
}
