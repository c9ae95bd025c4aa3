use chess::PieceColor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::tree::PositionNode;

/// Identifies a chapter across re-parses: trees are rebuilt from scratch on
/// refresh, so names are the only stable handle.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChapterKey {
    pub study: String,
    pub name: String,
}

impl std::fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.study.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}: {}", self.study, self.name)
        }
    }
}

/// One PGN game block of a study.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub name: String,
    pub study_name: String,
    pub headers: BTreeMap<String, String>,
    pub position_tree: PositionNode,
}

impl Chapter {
    /// Build a chapter from its tag pairs, deriving names from the recognised
    /// tags. `index` is the zero-based position of the game in its document.
    pub fn from_headers(
        headers: BTreeMap<String, String>,
        position_tree: PositionNode,
        index: usize,
    ) -> Self {
        let (study_name, name) = derive_names(&headers, index);
        Self {
            name,
            study_name,
            headers,
            position_tree,
        }
    }

    pub fn key(&self) -> ChapterKey {
        ChapterKey {
            study: self.study_name.clone(),
            name: self.name.clone(),
        }
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    /// The side the learner plays, from the `Orientation` tag.
    pub fn orientation(&self) -> PieceColor {
        self.header("Orientation")
            .and_then(PieceColor::parse)
            .unwrap_or(PieceColor::White)
    }

    /// Web address of the chapter, when the export carries one.
    pub fn url(&self) -> Option<&str> {
        self.header("ChapterURL").or_else(|| {
            self.header("Site")
                .filter(|site| site.starts_with("http://") || site.starts_with("https://"))
        })
    }

    /// Deep link to the position after `ply` half-moves.
    pub fn link_to_ply(&self, ply: usize) -> Option<String> {
        self.url().map(|url| format!("{}#{}", url, ply))
    }
}

/// Derive `(study_name, chapter_name)` from a chapter's tags.
///
/// Study exports write `[Event "Study: Chapter"]`; explicit `StudyName` and
/// `ChapterName` tags win when present.
fn derive_names(headers: &BTreeMap<String, String>, index: usize) -> (String, String) {
    let event = headers
        .get("Event")
        .map(|e| e.trim())
        .filter(|e| !e.is_empty() && *e != "?");
    let split = event.and_then(|e| e.split_once(": "));

    let study = headers
        .get("StudyName")
        .cloned()
        .or_else(|| split.map(|(study, _)| study.trim().to_string()))
        .unwrap_or_default();

    let name = headers
        .get("ChapterName")
        .cloned()
        .or_else(|| split.map(|(_, chapter)| chapter.trim().to_string()))
        .or_else(|| event.map(str::to_string))
        .unwrap_or_else(|| format!("Chapter {}", index + 1));

    (study, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{Rules, StandardRules};

    fn chapter(tags: &[(&str, &str)], index: usize) -> Chapter {
        let headers = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let root = PositionNode::new(StandardRules.start_position(None).unwrap());
        Chapter::from_headers(headers, root, index)
    }

    #[test]
    fn test_names_from_study_event() {
        let ch = chapter(&[("Event", "Sicilian Repertoire: Najdorf")], 0);
        assert_eq!(ch.study_name, "Sicilian Repertoire");
        assert_eq!(ch.name, "Najdorf");
    }

    #[test]
    fn test_explicit_name_tags_win() {
        let ch = chapter(
            &[
                ("Event", "Something: Else"),
                ("StudyName", "Caro-Kann"),
                ("ChapterName", "Advance"),
            ],
            0,
        );
        assert_eq!(ch.key().to_string(), "Caro-Kann: Advance");
    }

    #[test]
    fn test_fallback_names() {
        assert_eq!(chapter(&[("Event", "Casual game")], 0).name, "Casual game");
        assert_eq!(chapter(&[("Event", "?")], 2).name, "Chapter 3");
        assert_eq!(chapter(&[("White", "x")], 0).study_name, "");
    }

    #[test]
    fn test_orientation_and_links() {
        let ch = chapter(
            &[
                ("Event", "S: C"),
                ("Orientation", "black"),
                ("ChapterURL", "https://lichess.org/study/abc/def"),
            ],
            0,
        );
        assert_eq!(ch.orientation(), PieceColor::Black);
        assert_eq!(
            ch.link_to_ply(7).as_deref(),
            Some("https://lichess.org/study/abc/def#7")
        );

        let plain = chapter(&[("Event", "x"), ("Site", "?")], 0);
        assert_eq!(plain.orientation(), PieceColor::White);
        assert!(plain.link_to_ply(3).is_none());
    }
}
