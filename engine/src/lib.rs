//! Asynchronous UCI engine driver producing position evaluations.

pub mod stockfish;
pub mod uci;

pub use stockfish::{EngineConfig, StockfishEngine};
pub use uci::{EngineInfo, UciError, UciMessage};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Stockfish not found")]
    NotFound,
    #[error("Failed to spawn engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Engine has no {0}")]
    MissingPipe(&'static str),
    #[error("Timeout waiting for engine to respond")]
    Timeout,
    #[error("Engine closed")]
    Closed,
    #[error(transparent)]
    Uci(#[from] UciError),
}
