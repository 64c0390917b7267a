use thiserror::Error;

use crate::domain::{Side, PROBABILITY_TOLERANCE};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidProbabilities {
    #[error("{0} score probabilities are empty")]
    EmptyScoreProbabilities(Side),

    #[error("{side} score probabilities sum to {actual}, expected 1 ± {}", PROBABILITY_TOLERANCE)]
    ScoreProbabilities { side: Side, actual: f64 },

    #[error("win percentages sum to {actual}, expected 1 ± {}", PROBABILITY_TOLERANCE)]
    WinPercentages { actual: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("game has not concluded, so there is no winner")]
pub struct UndeterminedOutcome;
