//! Configuration for the openings trainer.
//!
//! Every value has a compile-time default and can be overridden at runtime
//! via a dedicated environment variable. Command-line flags take precedence
//! over both.

use std::path::PathBuf;

const DEFAULT_CONFIG_DIR: &str = ".config/openings/data";
const DEV_DATA_DIR: &str = "./data";

/// Default engine search depth for `eval`.
const DEFAULT_EVAL_DEPTH: u32 = 18;

/// Default evaluation cache size. Zero keeps every evaluation.
const DEFAULT_CACHE_CAPACITY: usize = 0;

/// Get the data directory for persistence.
///
/// Priority:
/// 1. OPENINGS_DATA_DIR env variable if set
/// 2. $HOME/.config/openings/data if HOME is set
/// 3. ./data as fallback
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OPENINGS_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(DEFAULT_CONFIG_DIR);
    }

    PathBuf::from(DEV_DATA_DIR)
}

/// Explicit Stockfish binary from OPENINGS_STOCKFISH_PATH. When unset the
/// engine searches common install locations.
pub fn get_stockfish_path() -> Option<PathBuf> {
    std::env::var("OPENINGS_STOCKFISH_PATH").ok().map(PathBuf::from)
}

/// Get the engine search depth.
///
/// Priority:
/// 1. OPENINGS_EVAL_DEPTH env variable if set (falls back to default if the
///    value cannot be parsed)
/// 2. 18 as fallback
pub fn get_eval_depth() -> u32 {
    if let Ok(depth) = std::env::var("OPENINGS_EVAL_DEPTH") {
        return depth.parse().unwrap_or(DEFAULT_EVAL_DEPTH);
    }

    DEFAULT_EVAL_DEPTH
}

/// Get the evaluation cache capacity from OPENINGS_CACHE_CAPACITY.
pub fn get_cache_capacity() -> usize {
    if let Ok(capacity) = std::env::var("OPENINGS_CACHE_CAPACITY") {
        return capacity.parse().unwrap_or(DEFAULT_CACHE_CAPACITY);
    }

    DEFAULT_CACHE_CAPACITY
}

/// Scheduler seed from OPENINGS_SEED. Unset means a fresh seed per run.
pub fn get_seed() -> Option<u64> {
    std::env::var("OPENINGS_SEED").ok()?.parse().ok()
}
