use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, IntoStaticStr};

use crate::fixed;
use crate::state::{LeagueState, ModelState};

pub mod error;

use error::{InvalidProbabilities, UndeterminedOutcome};

/// Tolerance on every probability sum that a prediction carries.
pub const PROBABILITY_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize, Deserialize)]
pub enum GameType {
    #[serde(rename = "Pr")]
    #[strum(serialize = "Pr")]
    PreSeason,
    #[serde(rename = "R")]
    #[strum(serialize = "R")]
    Regular,
    #[serde(rename = "P")]
    #[strum(serialize = "P")]
    Playoff,
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    AllStar,
    Other,
}
impl GameType {
    /// Maps the numeric game type of the league's schedule feed.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => GameType::PreSeason,
            2 => GameType::Regular,
            3 => GameType::Playoff,
            4 => GameType::AllStar,
            _ => GameType::Other,
        }
    }

    /// Playoff overtime is played until a goal is scored.
    pub fn has_shootout(&self) -> bool {
        !matches!(self, GameType::Playoff)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr, Serialize, Deserialize)]
pub enum GameState {
    Final,
    Future,
    Postponed,
}
impl GameState {
    /// Maps the game state code of the league's schedule feed. Unknown codes yield `None`.
    pub fn from_feed(code: &str) -> Option<Self> {
        match code {
            "OFF" | "FINAL" => Some(GameState::Final),
            "FUT" | "PRE" | "LIVE" | "CRIT" => Some(GameState::Future),
            "PPD" => Some(GameState::Postponed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
pub enum Side {
    Home,
    Away,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Score {
    pub home: u16,
    pub away: u16,
}
impl Score {
    pub fn new(home: u16, away: u16) -> Self {
        Self { home, away }
    }

    pub fn is_nil_all(&self) -> bool {
        self.home == 0 && self.away == 0
    }
}

/// One row of the game results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub game_pk: u64,
    pub game_date: NaiveDate,
    pub season: u32,
    pub game_type: GameType,
    pub game_state: GameState,
    pub home_team: String,
    pub away_team: String,
    pub home_reg_score: u16,
    pub away_reg_score: u16,
    pub home_fin_score: u16,
    pub away_fin_score: u16,
}
impl Game {
    pub fn home_won(&self) -> bool {
        self.home_fin_score > self.away_fin_score
    }

    pub fn final_score(&self) -> Score {
        Score::new(self.home_fin_score, self.away_fin_score)
    }

    pub fn regulation_score(&self) -> Score {
        Score::new(self.home_reg_score, self.away_reg_score)
    }

    pub fn is_final(&self) -> bool {
        self.game_state == GameState::Final
    }

    pub fn is_postponed(&self) -> bool {
        self.game_state == GameState::Postponed
    }
}

/// The final score of a predicted game, once known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "OutcomeRepr", into = "OutcomeRepr")]
pub enum GameOutcome {
    #[default]
    Pending,
    Final(Score),
}
impl GameOutcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, GameOutcome::Pending)
    }

    pub fn home_win(&self) -> Result<bool, UndeterminedOutcome> {
        match self {
            GameOutcome::Pending => Err(UndeterminedOutcome),
            GameOutcome::Final(score) => Ok(score.home > score.away),
        }
    }
}

const PENDING_SCORE: &str = "-";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ScoreRepr {
    Number(u16),
    Text(String),
}
impl ScoreRepr {
    fn parse(&self) -> Result<Option<u16>, String> {
        match self {
            ScoreRepr::Number(score) => Ok(Some(*score)),
            ScoreRepr::Text(text) if text == PENDING_SCORE => Ok(None),
            ScoreRepr::Text(text) => text
                .parse()
                .map(Some)
                .map_err(|err| format!("invalid score '{text}': {err}")),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OutcomeRepr {
    home_score: ScoreRepr,
    away_score: ScoreRepr,
}

impl TryFrom<OutcomeRepr> for GameOutcome {
    type Error = String;

    fn try_from(repr: OutcomeRepr) -> Result<Self, Self::Error> {
        match (repr.home_score.parse()?, repr.away_score.parse()?) {
            (None, None) => Ok(GameOutcome::Pending),
            (Some(home), Some(away)) => Ok(GameOutcome::Final(Score::new(home, away))),
            _ => Err("outcome must be either pending or final on both sides".into()),
        }
    }
}

impl From<GameOutcome> for OutcomeRepr {
    fn from(outcome: GameOutcome) -> Self {
        let (home_score, away_score) = match outcome {
            GameOutcome::Pending => (PENDING_SCORE.to_string(), PENDING_SCORE.to_string()),
            GameOutcome::Final(score) => (score.home.to_string(), score.away.to_string()),
        };
        Self {
            home_score: ScoreRepr::Text(home_score),
            away_score: ScoreRepr::Text(away_score),
        }
    }
}

fn check_sum(sum: f64) -> Result<(), f64> {
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE || sum.is_nan() {
        Err(sum)
    } else {
        Ok(())
    }
}

/// Independent goal distributions of each side. The last element of each holds the
/// probability of scoring more goals than the preceding elements enumerate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScoreProbabilitiesRepr")]
pub struct ScoreProbabilities {
    #[serde(serialize_with = "fixed::seq::serialize")]
    home: Vec<f64>,
    #[serde(serialize_with = "fixed::seq::serialize")]
    away: Vec<f64>,
}
impl ScoreProbabilities {
    pub fn try_new(home: Vec<f64>, away: Vec<f64>) -> Result<Self, InvalidProbabilities> {
        for (side, probs) in [(Side::Home, &home), (Side::Away, &away)] {
            if probs.is_empty() {
                return Err(InvalidProbabilities::EmptyScoreProbabilities(side));
            }
            check_sum(probs.iter().sum())
                .map_err(|actual| InvalidProbabilities::ScoreProbabilities { side, actual })?;
        }
        Ok(Self { home, away })
    }

    pub fn home(&self) -> &[f64] {
        &self.home
    }

    pub fn away(&self) -> &[f64] {
        &self.away
    }
}

#[derive(Deserialize)]
struct ScoreProbabilitiesRepr {
    #[serde(with = "fixed::seq")]
    home: Vec<f64>,
    #[serde(with = "fixed::seq")]
    away: Vec<f64>,
}

impl TryFrom<ScoreProbabilitiesRepr> for ScoreProbabilities {
    type Error = InvalidProbabilities;

    fn try_from(repr: ScoreProbabilitiesRepr) -> Result<Self, Self::Error> {
        Self::try_new(repr.home, repr.away)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamWinPercentage {
    #[serde(with = "fixed::scalar")]
    pub regulation: f64,
    #[serde(with = "fixed::scalar")]
    pub overtime: f64,
    #[serde(with = "fixed::scalar")]
    pub shootout: f64,
}
impl TeamWinPercentage {
    pub fn total(&self) -> f64 {
        self.regulation + self.overtime + self.shootout
    }
}

/// Win probabilities of both sides, split by the period in which the game is decided.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WinPercentagesRepr")]
pub struct WinPercentages {
    home: TeamWinPercentage,
    away: TeamWinPercentage,
}
impl WinPercentages {
    pub fn try_new(
        home: TeamWinPercentage,
        away: TeamWinPercentage,
    ) -> Result<Self, InvalidProbabilities> {
        check_sum(home.total() + away.total())
            .map_err(|actual| InvalidProbabilities::WinPercentages { actual })?;
        Ok(Self { home, away })
    }

    pub fn home(&self) -> &TeamWinPercentage {
        &self.home
    }

    pub fn away(&self) -> &TeamWinPercentage {
        &self.away
    }
}

#[derive(Deserialize)]
struct WinPercentagesRepr {
    home: TeamWinPercentage,
    away: TeamWinPercentage,
}

impl TryFrom<WinPercentagesRepr> for WinPercentages {
    type Error = InvalidProbabilities;

    fn try_from(repr: WinPercentagesRepr) -> Result<Self, Self::Error> {
        Self::try_new(repr.home, repr.away)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePrediction {
    pub game_pk: u64,
    pub home_team: String,
    pub away_team: String,
    pub outcome: GameOutcome,
    pub score_probabilities: ScoreProbabilities,
    pub win_percentages: WinPercentages,
}
impl GamePrediction {
    /// Probability of the home side winning, in any period.
    pub fn home_win_probability(&self) -> f64 {
        self.win_percentages.home.total()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionPerformance {
    pub prediction_date: NaiveDate,
    pub total_games: usize,
    #[serde(with = "fixed::scalar")]
    pub cumulative_accuracy: f64,
    #[serde(with = "fixed::scalar")]
    pub cumulative_log_loss: f64,
    #[serde(with = "fixed::scalar")]
    pub rolling_accuracy: f64,
    #[serde(with = "fixed::scalar")]
    pub rolling_log_loss: f64,
}

/// Everything published for one prediction date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub league: String,
    pub prediction_date: NaiveDate,
    pub deployment_version: String,
    pub league_state: LeagueState,
    pub predictions: Vec<GamePrediction>,
    #[serde(default)]
    pub prediction_performance: Vec<PredictionPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStateRecord {
    pub league: String,
    pub prediction_date: NaiveDate,
    pub state: ModelState,
}

#[cfg(test)]
mod tests;
