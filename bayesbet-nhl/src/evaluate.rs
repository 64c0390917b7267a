//! Scoring of past predictions against actual outcomes.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::info;

use crate::domain::{Game, GameOutcome, GamePrediction, PredictionPerformance, PredictionRecord};

/// Trailing span of the rolling statistics, in distinct prediction dates.
pub const DEFAULT_WINDOW: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("game {0} has not concluded, so its prediction cannot be scored")]
    UndeterminedOutcome(u64),

    #[error("no predictions to evaluate")]
    NoPredictions,

    #[error("window must span at least one date")]
    EmptyWindow,
}

/// Fills in the final scores of the record's pending predictions from `games`. Predictions of
/// postponed games and of games absent from `games` stay pending, as do games reported at 0–0.
pub fn update_scores(record: &PredictionRecord, games: &[Game]) -> PredictionRecord {
    let mut updated = record.clone();
    backfill(&mut updated.predictions, &index_games(games), record.prediction_date);
    updated
}

fn index_games(games: &[Game]) -> FxHashMap<u64, &Game> {
    games.iter().map(|game| (game.game_pk, game)).collect()
}

fn backfill(predictions: &mut [GamePrediction], games: &FxHashMap<u64, &Game>, date: NaiveDate) {
    for prediction in predictions.iter_mut().filter(|prediction| prediction.outcome.is_pending()) {
        let Some(game) = games.get(&prediction.game_pk) else {
            info!(
                "failed to update game scores on {date} with game_pk {}",
                prediction.game_pk
            );
            continue;
        };
        if game.is_postponed() {
            info!("game {} on {date} was postponed", prediction.game_pk);
            continue;
        }
        let score = game.final_score();
        if !score.is_nil_all() {
            prediction.outcome = GameOutcome::Final(score);
        }
    }
}

/// A prediction reduced to what scoring needs: whether the home side won, and the predicted
/// probability that it would.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scored {
    home_won: bool,
    home_win_prob: f64,
}

fn score_all(predictions: &[GamePrediction]) -> Result<Vec<Scored>, EvaluationError> {
    if predictions.is_empty() {
        return Err(EvaluationError::NoPredictions);
    }
    predictions
        .iter()
        .map(|prediction| {
            let home_won = prediction
                .outcome
                .home_win()
                .map_err(|_| EvaluationError::UndeterminedOutcome(prediction.game_pk))?;
            Ok(Scored {
                home_won,
                home_win_prob: prediction.home_win_probability(),
            })
        })
        .collect()
}

/// Fraction of predictions that favoured the eventual winner. A home win probability of
/// exactly one half counts as favouring the home side.
pub fn accuracy(predictions: &[GamePrediction]) -> Result<f64, EvaluationError> {
    Ok(accuracy_of(&score_all(predictions)?))
}

/// Mean negative log-likelihood of the actual outcomes.
pub fn log_loss(predictions: &[GamePrediction]) -> Result<f64, EvaluationError> {
    Ok(log_loss_of(&score_all(predictions)?))
}

fn accuracy_of(scored: &[Scored]) -> f64 {
    let correct = scored
        .iter()
        .filter(|scored| (scored.home_win_prob >= 0.5) == scored.home_won)
        .count();
    correct as f64 / scored.len() as f64
}

fn log_loss_of(scored: &[Scored]) -> f64 {
    let total = scored
        .iter()
        .map(|scored| {
            if scored.home_won {
                -scored.home_win_prob.ln()
            } else {
                -(1.0 - scored.home_win_prob).ln()
            }
        })
        .sum::<f64>();
    total / scored.len() as f64
}

/// Cumulative and rolling performance as of each distinct date of `history`, in ascending date
/// order. Pending outcomes are first filled in from `games`; predictions whose outcome is still
/// unknown are left out. The rolling statistics span the `window` most recent dates, or all
/// dates so far if there are fewer.
pub fn prediction_performance(
    history: &[PredictionRecord],
    games: &[Game],
    window: usize,
) -> Result<Vec<PredictionPerformance>, EvaluationError> {
    if window == 0 {
        return Err(EvaluationError::EmptyWindow);
    }
    let games = index_games(games);
    let mut rows = vec![];
    for record in history {
        let mut predictions = record.predictions.clone();
        backfill(&mut predictions, &games, record.prediction_date);
        for prediction in predictions {
            if let GameOutcome::Final(score) = prediction.outcome {
                rows.push((
                    record.prediction_date,
                    prediction.game_pk,
                    Scored {
                        home_won: score.home > score.away,
                        home_win_prob: prediction.home_win_probability(),
                    },
                ));
            }
        }
    }
    rows.sort_by_key(|&(date, game_pk, _)| (date, game_pk));

    let mut dates = rows.iter().map(|&(date, _, _)| date).collect::<Vec<_>>();
    dates.dedup();

    let mut performance = Vec::with_capacity(dates.len());
    for (index, &date) in dates.iter().enumerate() {
        let lower = dates[(index + 1).saturating_sub(window)];
        let cumulative = rows
            .iter()
            .take_while(|&&(row_date, _, _)| row_date <= date)
            .map(|&(_, _, scored)| scored)
            .collect::<Vec<_>>();
        let rolling = rows
            .iter()
            .filter(|&&(row_date, _, _)| row_date >= lower && row_date <= date)
            .map(|&(_, _, scored)| scored)
            .collect::<Vec<_>>();
        performance.push(PredictionPerformance {
            prediction_date: date,
            total_games: cumulative.len(),
            cumulative_accuracy: accuracy_of(&cumulative),
            cumulative_log_loss: log_loss_of(&cumulative),
            rolling_accuracy: accuracy_of(&rolling),
            rolling_log_loss: log_loss_of(&rolling),
        });
    }
    Ok(performance)
}
