use super::json_store::{JsonStore, Storable};
use super::PersistenceError;
use chess::fen::position_key;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Move statistics for one position, in the Lichess opening explorer shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerData {
    pub white: u64,
    pub draws: u64,
    pub black: u64,
    #[serde(default)]
    pub moves: Vec<ExplorerMove>,
    #[serde(default)]
    pub opening: Option<ExplorerOpening>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplorerMove {
    pub uci: String,
    pub san: String,
    pub white: u64,
    pub draws: u64,
    pub black: u64,
    #[serde(default)]
    pub average_rating: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerOpening {
    pub eco: String,
    pub name: String,
}

impl ExplorerData {
    pub fn games(&self) -> u64 {
        self.white + self.draws + self.black
    }
}

impl ExplorerMove {
    pub fn games(&self) -> u64 {
        self.white + self.draws + self.black
    }

    /// Share of points scored by white after this move, in percent.
    pub fn white_score(&self) -> Option<f64> {
        let games = self.games();
        (games > 0).then(|| (self.white as f64 + self.draws as f64 / 2.0) * 100.0 / games as f64)
    }
}

/// A stored explorer lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerRecord {
    pub fen: String,
    pub stored_at: u64,
    #[serde(flatten)]
    pub data: ExplorerData,
}

impl Storable for ExplorerRecord {
    fn id(&self) -> String {
        file_stem(&self.fen)
    }
}

/// Filename for a position: move counters dropped, separators replaced.
fn file_stem(fen: &str) -> String {
    position_key(fen)
        .chars()
        .map(|c| match c {
            '/' => '_',
            ' ' => '.',
            c => c,
        })
        .collect()
}

/// Cached explorer lookups under `explorer/`, keyed by position.
pub struct ExplorerStore {
    inner: JsonStore<ExplorerRecord>,
}

impl ExplorerStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join("explorer")),
        }
    }

    pub fn save(&self, record: &ExplorerRecord) -> Result<(), PersistenceError> {
        self.inner.save(record)?;
        Ok(())
    }

    pub fn lookup(&self, fen: &str) -> Result<Option<ExplorerRecord>, PersistenceError> {
        self.inner.load(&file_stem(fen))
    }
}
