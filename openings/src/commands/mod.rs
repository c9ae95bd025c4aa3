pub mod eval;
pub mod explorer;
pub mod practice;
pub mod study;

use anyhow::Context;
use repertoire::Chapter;
use std::path::Path;

/// Read and parse a PGN file. Malformed chapters are reported and skipped so
/// one bad game does not hide the rest of a study.
pub fn load_chapters(pgn: &Path) -> anyhow::Result<Vec<Chapter>> {
    let text = std::fs::read_to_string(pgn)
        .with_context(|| format!("failed to read {}", pgn.display()))?;

    let mut chapters = Vec::new();
    let mut first_error = None;
    for (index, result) in repertoire::parse_each(&text).into_iter().enumerate() {
        match result {
            Ok(chapter) => chapters.push(chapter),
            Err(e) => {
                tracing::warn!("Skipping game {} of {}: {}", index + 1, pgn.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match (chapters.is_empty(), first_error) {
        (true, Some(e)) => {
            Err(e).with_context(|| format!("no readable chapters in {}", pgn.display()))
        }
        _ => {
            tracing::info!("Loaded {} chapters from {}", chapters.len(), pgn.display());
            Ok(chapters)
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::PathBuf;

    pub const STUDY: &str = "[Event \"Repertoire: Italian\"]\n\
        [ChapterURL \"https://lichess.org/study/abc/one\"]\n\
        1. e4 e5 2. Nf3 Nc6 3. Bc4 (3. Bb5 a6) *\n\n\
        [Event \"Repertoire: Caro-Kann\"]\n\
        [Orientation \"black\"]\n\
        1. e4 c6 2. d4 d5 *\n";

    pub fn write_pgn(dir: &tempfile::TempDir, text: &str) -> PathBuf {
        let path = dir.path().join("study.pgn");
        std::fs::write(&path, text).unwrap();
        path
    }
}
