//! Opening repertoire model: PGN studies parsed into position trees, the
//! lines they contain, and the bookkeeping for practicing them.

pub mod attempt;
pub mod chapter;
pub mod eval_cache;
pub mod lines;
pub mod pgn;
pub mod scheduler;
pub mod status;
pub mod study;
pub mod tree;

pub use attempt::{record_attempt, record_attempt_at, Attempt, AttemptHistory, Outcome};
pub use chapter::{Chapter, ChapterKey};
pub use eval_cache::EvaluationCache;
pub use lines::{find_path_to_position, lines_of, replay, verify_line, Line, LineId};
pub use pgn::{parse, parse_each, ParseError, ParseErrorKind, PgnParser};
pub use scheduler::{ranked, reconcile_selection, NoLinesAvailable, Scheduler};
pub use status::{status, LineStatus, PracticeSession};
pub use study::{RefreshOutcome, RefreshTicket, Study};
pub use tree::PositionNode;
