use super::PersistenceError;
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Trait for types that can be persisted in a JsonStore.
pub trait Storable: Serialize + DeserializeOwned {
    /// File stem of the record; must be filename safe.
    fn id(&self) -> String;
}

/// Generic JSON-file-per-record persistence store.
pub struct JsonStore<T> {
    dir: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T: Storable> JsonStore<T> {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            _phantom: PhantomData,
        }
    }

    pub fn ensure_dir(&self) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Save a record. Returns the id.
    pub fn save(&self, data: &T) -> Result<String, PersistenceError> {
        self.ensure_dir()?;
        let id = data.id();
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(self.file_path(&id), json)?;
        Ok(id)
    }

    /// Load a record by id. Returns None if not found.
    pub fn load(&self, id: &str) -> Result<Option<T>, PersistenceError> {
        let path = self.file_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        let data = serde_json::from_str(&contents)?;
        Ok(Some(data))
    }

    /// Load all records from the store directory, skipping files that fail to parse.
    pub fn load_all(&self) -> Result<Vec<T>, PersistenceError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut items = Vec::new();
        let entries = std::fs::read_dir(&self.dir)?;

        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<T>(&contents) {
                    Ok(data) => items.push(data),
                    Err(e) => tracing::warn!("Skipping unreadable record {:?}: {}", path, e),
                },
                Err(e) => {
                    tracing::warn!("Failed to read file {:?}: {}", path, e);
                }
            }
        }

        Ok(items)
    }
}
