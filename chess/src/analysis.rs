//! Engine evaluation types shared by the cache and the engine driver.

use serde::{Deserialize, Serialize};

/// Engine evaluation score.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisScore {
    Centipawns(i32),
    Mate(i32),
}

impl AnalysisScore {
    pub fn display(&self) -> String {
        match self {
            Self::Centipawns(cp) => format!("{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) => {
                if *m > 0 {
                    format!("+M{}", m)
                } else {
                    format!("-M{}", m.abs())
                }
            }
        }
    }

    /// Negate the score (flip perspective).
    pub fn negate(&self) -> Self {
        match self {
            Self::Centipawns(cp) => Self::Centipawns(-cp),
            Self::Mate(m) => Self::Mate(-m),
        }
    }
}

impl std::fmt::Display for AnalysisScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// One engine evaluation of a position at a given search depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatedPosition {
    pub fen: String,
    pub score: AnalysisScore,
    /// Best move in UCI notation, when the engine reported one.
    pub best_move: Option<String>,
    /// Principal variation as UCI move strings.
    #[serde(default)]
    pub pv: Vec<String>,
    pub depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AnalysisScore::Centipawns(35).display(), "+0.35");
        assert_eq!(AnalysisScore::Centipawns(-120).display(), "-1.20");
        assert_eq!(AnalysisScore::Mate(3).display(), "+M3");
        assert_eq!(AnalysisScore::Mate(-2).display(), "-M2");
    }

    #[test]
    fn test_negate() {
        assert_eq!(
            AnalysisScore::Centipawns(40).negate(),
            AnalysisScore::Centipawns(-40)
        );
        assert_eq!(AnalysisScore::Mate(2).negate(), AnalysisScore::Mate(-2));
    }
}
