//! Error type shared by the engine, the aggregators and the roster loader.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DuelError {
    /// A probability check ran before a random stream was bound to the battle.
    #[error("random stream used before it was bound to a battle")]
    UnboundRandomStream,

    /// Chance checks only accept probabilities in `[0, 1]`.
    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("round robin needs at least two combatants, got {size}")]
    RosterTooSmall { size: usize },

    #[error("unknown combatant '{0}'")]
    UnknownCombatant(String),

    #[error("failed to read roster config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse roster config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("csv export failed: {0}")]
    Csv(String),
}

impl From<csv::Error> for DuelError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_values() {
        assert!(DuelError::ProbabilityOutOfRange(1.5)
            .to_string()
            .contains("1.5"));
        assert!(DuelError::RosterTooSmall { size: 1 }
            .to_string()
            .contains("got 1"));
        assert!(DuelError::UnknownCombatant("Nobody".to_string())
            .to_string()
            .contains("Nobody"));
    }
}
