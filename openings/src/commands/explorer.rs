//! Stored opening-explorer statistics, shown against the repertoire.

use anyhow::Context;
use chess::{Rules, StandardRules};
use repertoire::{find_path_to_position, Chapter, PositionNode};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use crate::persistence::{ExplorerData, ExplorerRecord, ExplorerStore};

/// UCI moves the repertoire continues with from `fen`, across all chapters.
pub fn repertoire_moves(chapters: &[Chapter], fen: &str) -> BTreeSet<String> {
    let mut moves = BTreeSet::new();
    for chapter in chapters {
        let Some(path) = find_path_to_position(chapter, fen) else {
            continue;
        };
        let mut node: &PositionNode = &chapter.position_tree;
        for mv in &path {
            match node.child_for(&mv.uci) {
                Some(index) => node = &node.children[index],
                None => break,
            }
        }
        moves.extend(
            node.children
                .iter()
                .filter_map(|child| child.position.last_move())
                .map(|mv| mv.uci.clone()),
        );
    }
    moves
}

pub fn show(
    store: &ExplorerStore,
    fen: &str,
    chapters: &[Chapter],
    out: &mut impl Write,
) -> anyhow::Result<bool> {
    let Some(record) = store.lookup(fen)? else {
        writeln!(out, "No explorer data stored for this position")?;
        return Ok(false);
    };
    let data = &record.data;
    let ours = repertoire_moves(chapters, fen);

    if let Some(opening) = &data.opening {
        writeln!(out, "{} {}", opening.eco, opening.name)?;
    }
    writeln!(
        out,
        "{} games: +{} ={} -{}",
        data.games(),
        data.white,
        data.draws,
        data.black
    )?;

    let mut moves: Vec<_> = data.moves.iter().collect();
    moves.sort_by_key(|m| std::cmp::Reverse(m.games()));
    for mv in moves {
        let marker = if ours.contains(&mv.uci) { "*" } else { " " };
        let score = mv
            .white_score()
            .map(|s| format!("{:.1}%", s))
            .unwrap_or_else(|| "-".to_string());
        let rating = mv
            .average_rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{} {:<7} {:>8} games  white {:>6}  avg {}",
            marker,
            mv.san,
            mv.games(),
            score,
            rating
        )?;
    }
    Ok(true)
}

/// Store explorer statistics for `fen` from a JSON file in the Lichess shape.
pub fn import(store: &ExplorerStore, fen: &str, file: &Path) -> anyhow::Result<ExplorerRecord> {
    let position = StandardRules
        .start_position(Some(fen))
        .with_context(|| format!("invalid FEN {:?}", fen))?;
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let data: ExplorerData = serde_json::from_str(&text)
        .with_context(|| format!("{} is not explorer data", file.display()))?;

    let record = ExplorerRecord {
        fen: position.fen().to_string(),
        stored_at: repertoire::attempt::now_timestamp(),
        data,
    };
    store.save(&record).context("failed to store explorer data")?;
    tracing::info!(moves = record.data.moves.len(), "explorer data imported");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::STUDY;

    const AFTER_E4_JSON: &str = r#"{
        "white": 10, "draws": 2, "black": 8,
        "moves": [
            {"uci": "c7c5", "san": "c5", "white": 3, "draws": 1, "black": 4},
            {"uci": "e7e5", "san": "e5", "white": 6, "draws": 1, "black": 3, "averageRating": 2100},
            {"uci": "c7c6", "san": "c6", "white": 1, "draws": 0, "black": 1}
        ],
        "opening": {"eco": "B00", "name": "King's Pawn Game"}
    }"#;

    fn after_e4(chapters: &[Chapter]) -> String {
        chapters[0].position_tree.children[0].position.fen().to_string()
    }

    #[test]
    fn test_repertoire_moves_across_chapters() {
        let chapters = repertoire::parse(STUDY).unwrap();
        let moves = repertoire_moves(&chapters, &after_e4(&chapters));
        let expected: BTreeSet<String> = ["e7e5".to_string(), "c7c6".to_string()].into();
        assert_eq!(moves, expected);
        assert!(repertoire_moves(&chapters, "8/8/8/8/8/8/8/K6k w - - 0 1").is_empty());
    }

    #[test]
    fn test_import_then_show() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ExplorerStore::new(tmp.path());
        let chapters = repertoire::parse(STUDY).unwrap();
        let fen = after_e4(&chapters);

        let json = tmp.path().join("e4.json");
        std::fs::write(&json, AFTER_E4_JSON).unwrap();
        let record = import(&store, &fen, &json).unwrap();
        assert_eq!(record.data.games(), 20);

        let mut out = Vec::new();
        assert!(show(&store, &fen, &chapters, &mut out).unwrap());
        let text = String::from_utf8(out).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "B00 King's Pawn Game");
        assert_eq!(rows[1], "20 games: +10 =2 -8");
        assert!(rows[2].starts_with("* e5"));
        assert!(rows[3].starts_with("  c5"));
        assert!(rows[4].starts_with("* c6"));
    }

    #[test]
    fn test_import_rejects_bad_input() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ExplorerStore::new(tmp.path());
        let json = tmp.path().join("bad.json");
        std::fs::write(&json, "{\"moves\": 3}").unwrap();
        assert!(import(&store, chess::STARTING_FEN, &json).is_err());
        assert!(import(&store, "garbage", &json).is_err());

        let mut out = Vec::new();
        assert!(!show(&store, chess::STARTING_FEN, &[], &mut out).unwrap());
    }
}
