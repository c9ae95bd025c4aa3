use chess::EvaluatedPosition;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;

enum Entries {
    Unbounded(HashMap<String, EvaluatedPosition>),
    Bounded(LruCache<String, EvaluatedPosition>),
}

/// In-memory cache for engine evaluations keyed by FEN.
///
/// An entry is only replaced by a strictly deeper evaluation, so a late
/// result of equal or lower depth never clobbers one already stored.
pub struct EvaluationCache {
    entries: Entries,
}

impl Default for EvaluationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EvaluationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl EvaluationCache {
    pub fn new() -> Self {
        Self {
            entries: Entries::Unbounded(HashMap::new()),
        }
    }

    /// A cache holding at most `capacity` positions, evicting the least
    /// recently used. Zero means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        match NonZeroUsize::new(capacity) {
            Some(cap) => Self {
                entries: Entries::Bounded(LruCache::new(cap)),
            },
            None => Self::new(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        match &self.entries {
            Entries::Unbounded(_) => None,
            Entries::Bounded(lru) => Some(lru.cap().get()),
        }
    }

    pub fn get(&mut self, fen: &str) -> Option<&EvaluatedPosition> {
        match &mut self.entries {
            Entries::Unbounded(map) => map.get(fen),
            Entries::Bounded(lru) => lru.get(fen),
        }
    }

    /// Get a cached evaluation, but only if it was computed at >= `min_depth`.
    pub fn get_at_depth(&mut self, fen: &str, min_depth: u32) -> Option<&EvaluatedPosition> {
        self.get(fen).filter(|e| e.depth >= min_depth)
    }

    /// Insert or update an evaluation. Only overwrites if new depth > existing.
    /// Returns whether the evaluation was stored.
    pub fn put(&mut self, eval: EvaluatedPosition) -> bool {
        let existing_depth = match &self.entries {
            Entries::Unbounded(map) => map.get(&eval.fen).map(|e| e.depth),
            Entries::Bounded(lru) => lru.peek(&eval.fen).map(|e| e.depth),
        };
        if existing_depth.is_some_and(|depth| depth >= eval.depth) {
            tracing::trace!(fen = %eval.fen, depth = eval.depth, "keeping evaluation of equal or greater depth");
            return false;
        }

        match &mut self.entries {
            Entries::Unbounded(map) => {
                map.insert(eval.fen.clone(), eval);
            }
            Entries::Bounded(lru) => {
                lru.put(eval.fen.clone(), eval);
            }
        }
        true
    }

    /// Number of entries in the cache.
    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::Unbounded(map) => map.len(),
            Entries::Bounded(lru) => lru.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match &mut self.entries {
            Entries::Unbounded(map) => map.clear(),
            Entries::Bounded(lru) => lru.clear(),
        }
    }
}
