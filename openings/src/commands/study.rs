//! Read-only views of a study: chapters, lines, position lookup and history.

use repertoire::{find_path_to_position, lines_of, ranked, AttemptHistory, Chapter, Line};
use std::collections::BTreeSet;
use std::io::Write;

pub fn chapters(chapters: &[Chapter], out: &mut impl Write) -> anyhow::Result<()> {
    for chapter in chapters {
        let tree = &chapter.position_tree;
        writeln!(
            out,
            "{}  [{}]  lines: {}  positions: {}  depth: {}",
            chapter.key(),
            chapter.orientation(),
            tree.leaf_count(),
            tree.node_count(),
            tree.depth()
        )?;
        if let Some(url) = chapter.url() {
            writeln!(out, "    {}", url)?;
        }
    }
    Ok(())
}

fn selected_lines(chapters: &[Chapter], selected: &BTreeSet<String>) -> Vec<Line> {
    chapters
        .iter()
        .filter(|c| selected.is_empty() || selected.contains(&c.name))
        .flat_map(lines_of)
        .collect()
}

pub fn lines(
    chapters: &[Chapter],
    selected: &BTreeSet<String>,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    for line in selected_lines(chapters, selected) {
        writeln!(out, "{}  {}: {}", line.id(), line.chapter.name, line.movetext())?;
    }
    Ok(())
}

/// Where `fen` occurs in each chapter, with a deep link when available.
pub fn find(chapters: &[Chapter], fen: &str, out: &mut impl Write) -> anyhow::Result<bool> {
    let mut found = false;
    for chapter in chapters {
        let Some(path) = find_path_to_position(chapter, fen) else {
            continue;
        };
        found = true;

        let line = Line {
            moves: path,
            chapter: chapter.key(),
            start_fen: chapter.position_tree.position.fen().to_string(),
            leaf_fen: fen.to_string(),
        };
        let moves = if line.is_empty() {
            "(chapter start)".to_string()
        } else {
            line.movetext()
        };
        writeln!(out, "{}: {}", chapter.key(), moves)?;
        if let Some(link) = chapter.link_to_ply(line.len()) {
            writeln!(out, "    {}", link)?;
        }
    }

    if !found {
        writeln!(out, "Position not found in any chapter")?;
    }
    Ok(found)
}

/// Lines in scheduling order, with their attempt record.
pub fn history(
    chapters: &[Chapter],
    selected: &BTreeSet<String>,
    history: &AttemptHistory,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let lines = selected_lines(chapters, selected);
    for (line, w) in ranked(&lines, history, &BTreeSet::new()) {
        let id = line.id();
        let latest = history
            .latest_for(&id)
            .map(|a| a.outcome.to_string())
            .unwrap_or_else(|| "never practiced".to_string());
        writeln!(
            out,
            "weight {:>2}  attempts {:>3}  streak {:>2}  {:<16} {}: {}",
            w,
            history.attempts_for(&id).len(),
            history.success_streak(&id),
            latest,
            line.chapter.name,
            line.movetext()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::STUDY;
    use repertoire::{parse, record_attempt_at, Outcome};

    fn output(f: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_chapters_listing() {
        let chapters = parse(STUDY).unwrap();
        let text = output(|out| super::chapters(&chapters, out));
        assert!(text.contains("Repertoire: Italian  [white]  lines: 2"));
        assert!(text.contains("Repertoire: Caro-Kann  [black]  lines: 1"));
        assert!(text.contains("https://lichess.org/study/abc/one"));
    }

    #[test]
    fn test_lines_respect_selection() {
        let chapters = parse(STUDY).unwrap();
        let only: BTreeSet<String> = ["Caro-Kann".to_string()].into();
        let text = output(|out| lines(&chapters, &only, out));
        assert_eq!(text.lines().count(), 1);
        assert!(text.trim_end().ends_with("Caro-Kann: 1. e4 c6 2. d4 d5"));
    }

    #[test]
    fn test_find_prints_link() {
        let chapters = parse(STUDY).unwrap();
        let italian = lines_of(&chapters[0]);
        let mut out = Vec::new();
        assert!(find(&chapters, &italian[1].leaf_fen, &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. e4 e5 2. Nf3 Nc6 3. Bb5 a6"));
        assert!(text.contains("https://lichess.org/study/abc/one#6"));

        let mut out = Vec::new();
        assert!(!find(&chapters, "8/8/8/8/8/8/8/K6k w - - 0 1", &mut out).unwrap());
    }

    #[test]
    fn test_history_ranks_untried_first() {
        let chapters = parse(STUDY).unwrap();
        let all = selected_lines(&chapters, &BTreeSet::new());
        let mut hist = AttemptHistory::new();
        record_attempt_at(&mut hist, &all[0], Outcome::Success, None, 1);

        let text = output(|out| history(&chapters, &BTreeSet::new(), &hist, out));
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[2].starts_with("weight  4  attempts   1  streak  1  success"));
        assert!(rows[0].contains("never practiced"));
    }
}
