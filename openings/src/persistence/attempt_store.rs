use super::json_store::{JsonStore, Storable};
use super::PersistenceError;
use repertoire::{Attempt, AttemptHistory};
use std::path::Path;

impl Storable for Attempt {
    fn id(&self) -> String {
        self.attempt_id.to_string()
    }
}

/// Practice attempts, one JSON file each under `attempts/`.
pub struct AttemptStore {
    inner: JsonStore<Attempt>,
}

impl AttemptStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join("attempts")),
        }
    }

    pub fn save(&self, attempt: &Attempt) -> Result<(), PersistenceError> {
        self.inner.save(attempt)?;
        Ok(())
    }

    /// Rebuild the full attempt history from disk.
    pub fn load_history(&self) -> Result<AttemptHistory, PersistenceError> {
        let attempts = self.inner.load_all()?;
        tracing::debug!(count = attempts.len(), dir = ?self.inner.dir(), "loaded attempts");
        Ok(AttemptHistory::from_attempts(attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use repertoire::{lines_of, parse, record_attempt_at, Outcome};

    #[test]
    fn test_history_survives_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttemptStore::new(tmp.path());
        let chapter = parse("[Event \"R: C\"]\n1. d4 d5 2. c4 *").unwrap().remove(0);
        let line = lines_of(&chapter).remove(0);

        let mut history = AttemptHistory::new();
        for (t, outcome) in [(3, Outcome::Success), (1, Outcome::Failure), (2, Outcome::Success)] {
            let attempt = record_attempt_at(&mut history, &line, outcome, None, t);
            store.save(&attempt).unwrap();
        }

        let reloaded = store.load_history().unwrap();
        assert_eq!(reloaded.len(), 3);
        let times: Vec<u64> = reloaded
            .attempts_for(&line.id())
            .iter()
            .map(|a| a.timestamp)
            .collect();
        assert_eq!(times, vec![1, 2, 3]);
        assert_eq!(reloaded.success_streak(&line.id()), 2);
    }

    #[test]
    fn test_same_second_attempts_reload_in_order() {
        let chapter = parse("[Event \"R: C\"]\n1. e4 e5 2. Nf3 *").unwrap().remove(0);
        let line = lines_of(&chapter).remove(0);

        // File order from the directory listing varies, so repeat the reload
        for _ in 0..20 {
            let tmp = tempfile::tempdir().unwrap();
            let store = AttemptStore::new(tmp.path());
            let mut history = AttemptHistory::new();
            for outcome in [Outcome::Failure, Outcome::Success] {
                let attempt = record_attempt_at(&mut history, &line, outcome, None, 100);
                store.save(&attempt).unwrap();
            }

            let reloaded = store.load_history().unwrap();
            assert_eq!(reloaded.latest_for(&line.id()).unwrap().outcome, Outcome::Success);
            assert_eq!(reloaded.success_streak(&line.id()), 1);
        }
    }

    #[test]
    fn test_empty_store() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AttemptStore::new(&tmp.path().join("nothing-here"));
        assert!(store.load_history().unwrap().is_empty());
    }
}
