//! The iterative update model.
//!
//! Each league day, [`IterativeUpdateModel::fit`] widens the current beliefs, conditions them on
//! that day's results and replaces them with the posterior. [`IterativeUpdateModel::predict`]
//! turns the current beliefs into outcome probabilities by numerical integration, without
//! sampling.
//!
//! Successive calls to `fit` must follow the chronological order of the game days, since each
//! posterior becomes the next prior.

use std::time::Instant;

use anyhow::bail;
use thiserror::Error;
use tracing::{debug, warn};

use bayesbet::factorial::Lookup;
use bayesbet::mcmc::SampleError;
use bayesbet::normal::Normal;
use bayesbet::poisson;
use bayesbet::quad::QuadConfig;
use bayesbet::rate;

use crate::domain::error::InvalidProbabilities;
use crate::domain::{
    Game, GameOutcome, GamePrediction, ScoreProbabilities, TeamWinPercentage, WinPercentages,
};
use crate::model::inference::{Layout, Observation, PriorSpec, Sampler};
use crate::state::{InvalidState, ModelState, ModelVariables, Ratings, TeamState};

pub mod inference;

/// Length of regular-season overtime, as a fraction of regulation time.
pub const SHOOTOUT_TIME: f64 = 5.0 / 60.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Factor by which every standard deviation is widened before each update.
    pub fattening_factor: f64,

    /// Cap on any standard deviation after widening.
    pub f_thresh: f64,

    /// Standard deviation of the daily random walk of team ratings.
    pub delta_sigma: f64,

    /// Goals enumerated individually by the score distributions; more goals share an
    /// overflow bucket.
    pub max_goals: u8,

    /// Overtime before a shootout, as a fraction of regulation time.
    pub shootout_time: f64,

    pub quad: QuadConfig,
}
impl Config {
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.fattening_factor < 1.0 {
            bail!("fattening factor cannot be less than 1");
        }
        if self.f_thresh <= 0.0 {
            bail!("standard deviation cap must be positive");
        }
        if self.delta_sigma < 0.0 {
            bail!("random walk standard deviation cannot be negative");
        }
        if self.max_goals == 0 || self.max_goals > 33 {
            bail!("max goals must lie in 1..=33");
        }
        if self.shootout_time <= 0.0 || self.shootout_time > 1.0 {
            bail!("shootout time must lie in (0, 1]");
        }
        self.quad.validate()?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fattening_factor: 1.05,
            f_thresh: 0.075,
            delta_sigma: 0.001,
            max_goals: 9,
            shootout_time: SHOOTOUT_TIME,
            quad: QuadConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
#[error("invalid model config: {0}")]
pub struct ValidationError(#[from] anyhow::Error);

#[derive(Debug, Error)]
pub enum FitError {
    #[error("prior of {0} has no spread")]
    DegeneratePrior(String),

    #[error("sampling failed: {0}")]
    Sample(#[from] SampleError),

    #[error("sampler returned {actual} dimensions, expected {expected}")]
    TraceDimensions { expected: usize, actual: usize },

    #[error("sampler returned no draws")]
    EmptyTrace,

    #[error("invalid posterior: {0}")]
    InvalidState(#[from] InvalidState),
}

pub struct IterativeUpdateModel<S> {
    config: Config,
    priors: ModelState,
    sampler: S,
    factorial: Lookup,
}
impl<S: Sampler> IterativeUpdateModel<S> {
    pub fn try_new(config: Config, priors: ModelState, sampler: S) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            priors,
            sampler,
            factorial: Lookup::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn priors(&self) -> &ModelState {
        &self.priors
    }

    pub fn into_priors(self) -> ModelState {
        self.priors
    }

    /// Updates the beliefs from the games of one day, returning the posterior that replaces
    /// the priors. Games that are not final are ignored. On error, the priors are unchanged.
    pub fn fit(&mut self, games: &[Game]) -> Result<ModelState, FitError> {
        let start_time = Instant::now();
        let mut priors = self
            .priors
            .fattened(self.config.fattening_factor, self.config.f_thresh);
        let observations = games
            .iter()
            .filter(|game| game.is_final())
            .map(|game| Observation {
                home: priors.include(&game.home_team),
                away: priors.include(&game.away_team),
                home_goals: game.home_reg_score,
                away_goals: game.away_reg_score,
                home_won: game.home_won(),
            })
            .collect::<Vec<_>>();

        let prior = self.prior_spec(&priors)?;
        let trace = self.sampler.sample(&prior, &observations)?;
        let layout = Layout::new(priors.teams().len());
        if trace.dimensions() != layout.dimensions() {
            return Err(FitError::TraceDimensions {
                expected: layout.dimensions(),
                actual: trace.dimensions(),
            });
        }

        let fit = |dimension: usize| {
            Normal::fit(trace.column(dimension)).ok_or(FitError::EmptyTrace)
        };
        let teams = 0..priors.teams().len();
        let variables = ModelVariables {
            i: fit(Layout::I)?,
            h: fit(Layout::H)?,
            o: teams
                .clone()
                .map(|team| fit(layout.o(team)))
                .collect::<Result<Ratings, _>>()?,
            d: teams
                .map(|team| fit(layout.d(team)))
                .collect::<Result<Ratings, _>>()?,
        };
        let posteriors = ModelState::try_new(priors.teams().to_vec(), variables)?;
        debug!(
            "fitted {} games from {} draws in {:?}: i={:?}, h={:?}",
            observations.len(),
            trace.len(),
            start_time.elapsed(),
            posteriors.variables().i,
            posteriors.variables().h
        );
        self.priors = posteriors.clone();
        Ok(posteriors)
    }

    fn prior_spec(&self, priors: &ModelState) -> Result<PriorSpec, FitError> {
        let variables = priors.variables();
        for (name, normal) in [("intercept", variables.i), ("home advantage", variables.h)] {
            if normal.stddev.is_nan() || normal.stddev <= 0.0 {
                return Err(FitError::DegeneratePrior(name.into()));
            }
        }
        let delta_sigma = self.config.delta_sigma;
        for (index, team) in priors.teams().iter().enumerate() {
            if variables.o.get(index).stddev <= 0.0 && delta_sigma <= 0.0 {
                return Err(FitError::DegeneratePrior(format!("offense of {team}")));
            }
            if variables.d.get(index).stddev <= 0.0 && delta_sigma <= 0.0 {
                return Err(FitError::DegeneratePrior(format!("defense of {team}")));
            }
        }
        Ok(PriorSpec {
            i: variables.i,
            h: variables.h,
            o: variables.o.iter().collect(),
            d: variables.d.iter().collect(),
            delta_sigma,
        })
    }
}

impl<S> IterativeUpdateModel<S> {
    pub fn predict(&self, games: &[Game]) -> Result<Vec<GamePrediction>, InvalidProbabilities> {
        games
            .iter()
            .map(|game| self.single_game_prediction(game))
            .collect()
    }

    pub fn single_game_prediction(&self, game: &Game) -> Result<GamePrediction, InvalidProbabilities> {
        let variables = self.priors.variables();
        let home = self.team_state(&game.home_team);
        let away = self.team_state(&game.away_team);
        let log_rate_home =
            Normal::sum_independent(&[variables.i, variables.h, home.o, away.d.negate()]);
        let log_rate_away = Normal::sum_independent(&[variables.i, away.o, home.d.negate()]);

        let quad = &self.config.quad;
        let max_goals = self.config.max_goals;
        let home_pmf = poisson::mixture_pmf(&log_rate_home, max_goals, &self.factorial, quad);
        let away_pmf = poisson::mixture_pmf(&log_rate_away, max_goals, &self.factorial, quad);

        let home_race = rate::race(&log_rate_home, &log_rate_away, quad);
        let away_race = 1.0 - home_race;
        let (ot_prob, so_prob) = if game.game_type.has_shootout() {
            let ot_prob = rate::event_within(
                self.config.shootout_time,
                &log_rate_home,
                &log_rate_away,
                quad,
            );
            (ot_prob, 1.0 - ot_prob)
        } else {
            (1.0, 0.0)
        };

        let mut home_win = TeamWinPercentage::default();
        let mut away_win = TeamWinPercentage::default();
        for (home_goals, &home_prob) in home_pmf.iter().enumerate() {
            for (away_goals, &away_prob) in away_pmf.iter().enumerate() {
                let prob = home_prob * away_prob;
                if home_goals > away_goals {
                    home_win.regulation += prob;
                } else if away_goals > home_goals {
                    away_win.regulation += prob;
                } else {
                    home_win.overtime += prob * ot_prob * home_race;
                    home_win.shootout += prob * so_prob * home_race;
                    away_win.overtime += prob * ot_prob * away_race;
                    away_win.shootout += prob * so_prob * away_race;
                }
            }
        }
        debug!(
            "game {}: {} {:.3} ({:?}) vs {} {:.3} ({:?})",
            game.game_pk,
            game.home_team,
            home_win.total(),
            log_rate_home,
            game.away_team,
            away_win.total(),
            log_rate_away
        );

        Ok(GamePrediction {
            game_pk: game.game_pk,
            home_team: game.home_team.clone(),
            away_team: game.away_team.clone(),
            outcome: if game.is_final() {
                GameOutcome::Final(game.final_score())
            } else {
                GameOutcome::Pending
            },
            score_probabilities: ScoreProbabilities::try_new(home_pmf, away_pmf)?,
            win_percentages: WinPercentages::try_new(home_win, away_win)?,
        })
    }

    fn team_state(&self, team: &str) -> TeamState {
        self.priors.team_state(team).unwrap_or_else(|| {
            let default = TeamState::default();
            warn!(
                "did not find team {team} in the priors, defaulting to μ={} and σ={}",
                default.o.mean, default.o.stddev
            );
            default
        })
    }
}
