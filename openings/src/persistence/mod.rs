mod attempt_store;
mod explorer_store;
mod json_store;

pub use attempt_store::AttemptStore;
pub use explorer_store::{ExplorerData, ExplorerRecord, ExplorerStore};

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
