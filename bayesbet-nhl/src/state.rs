//! Latent model parameters, in two interchangeable forms.
//!
//! [`ModelState`] is the array form that inference works on: an ordered list of team names
//! and, for each rating, parallel vectors of means and standard deviations indexed by team
//! position. [`LeagueState`] is the name-keyed form used for interchange. Conversion between
//! the two preserves team order and reproduces every value exactly.

use std::fmt::Formatter;
use std::marker::PhantomData;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

use bayesbet::normal::Normal;

use crate::fixed;

/// Rating assumed for a team that the state knows nothing about.
pub const DEFAULT_TEAM_RATING: Normal = Normal::new(0.0, 0.15);

/// Starting intercept of a model that has seen no games.
pub const COLD_START_INTERCEPT: Normal = Normal::new(1.0, 0.1);

/// Starting home advantage of a model that has seen no games.
pub const COLD_START_HOME_ADVANTAGE: Normal = Normal::new(0.25, 0.1);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidState {
    #[error("{ratings} ratings hold {actual} entries for {expected} teams")]
    Misaligned {
        ratings: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("team {0} appears more than once")]
    DuplicateTeam(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamState {
    /// Offense: raises the team's own scoring log-rate.
    #[serde(with = "fixed::normal")]
    pub o: Normal,

    /// Defense: lowers the opponent's scoring log-rate.
    #[serde(with = "fixed::normal")]
    pub d: Normal,
}
impl Default for TeamState {
    fn default() -> Self {
        Self {
            o: DEFAULT_TEAM_RATING,
            d: DEFAULT_TEAM_RATING,
        }
    }
}

/// Team states keyed by name, kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct TeamStates {
    entries: Vec<(String, TeamState)>,
    index: FxHashMap<String, usize>,
}
impl TeamStates {
    /// Inserts or replaces the state of a team. A replaced team keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, state: TeamState) -> Option<TeamState> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, state)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, state));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&TeamState> {
        self.index.get(name).map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TeamState)> {
        self.entries.iter().map(|(name, state)| (name.as_str(), state))
    }
}

impl PartialEq for TeamStates {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<S: Into<String>> FromIterator<(S, TeamState)> for TeamStates {
    fn from_iter<T: IntoIterator<Item = (S, TeamState)>>(iter: T) -> Self {
        let mut teams = TeamStates::default();
        for (name, state) in iter {
            teams.insert(name, state);
        }
        teams
    }
}

impl Serialize for TeamStates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

struct TeamStatesVisitor(PhantomData<TeamStates>);

impl<'de> Visitor<'de> for TeamStatesVisitor {
    type Value = TeamStates;

    fn expecting(&self, formatter: &mut Formatter) -> std::fmt::Result {
        formatter.write_str("a map of team names to team states")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut teams = TeamStates::default();
        while let Some((name, state)) = map.next_entry::<String, TeamState>()? {
            if teams.contains(&name) {
                return Err(A::Error::custom(InvalidState::DuplicateTeam(name)));
            }
            teams.insert(name, state);
        }
        Ok(teams)
    }
}

impl<'de> Deserialize<'de> for TeamStates {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TeamStatesVisitor(PhantomData))
    }
}

/// League-wide parameters together with every team's state, keyed by team name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueState {
    /// Intercept: the baseline scoring log-rate.
    #[serde(with = "fixed::normal")]
    pub i: Normal,

    /// Home advantage on the scoring log-rate.
    #[serde(with = "fixed::normal")]
    pub h: Normal,

    pub teams: TeamStates,
}

/// One rating across all teams, as parallel means and standard deviations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RatingsRepr", into = "RatingsRepr")]
pub struct Ratings {
    means: Vec<f64>,
    stddevs: Vec<f64>,
}
impl Ratings {
    pub fn try_new(means: Vec<f64>, stddevs: Vec<f64>) -> Result<Self, InvalidState> {
        if means.len() != stddevs.len() {
            return Err(InvalidState::Misaligned {
                ratings: "stddev",
                expected: means.len(),
                actual: stddevs.len(),
            });
        }
        Ok(Self { means, stddevs })
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn means(&self) -> &[f64] {
        &self.means
    }

    pub fn stddevs(&self) -> &[f64] {
        &self.stddevs
    }

    pub fn get(&self, index: usize) -> Normal {
        Normal::new(self.means[index], self.stddevs[index])
    }

    pub fn push(&mut self, normal: Normal) {
        self.means.push(normal.mean);
        self.stddevs.push(normal.stddev);
    }

    pub fn iter(&self) -> impl Iterator<Item = Normal> + '_ {
        self.means
            .iter()
            .zip(&self.stddevs)
            .map(|(&mean, &stddev)| Normal::new(mean, stddev))
    }
}

impl FromIterator<Normal> for Ratings {
    fn from_iter<T: IntoIterator<Item = Normal>>(iter: T) -> Self {
        let mut ratings = Ratings::default();
        for normal in iter {
            ratings.push(normal);
        }
        ratings
    }
}

#[derive(Serialize, Deserialize)]
struct RatingsRepr(
    #[serde(with = "fixed::seq")] Vec<f64>,
    #[serde(with = "fixed::seq")] Vec<f64>,
);

impl TryFrom<RatingsRepr> for Ratings {
    type Error = InvalidState;

    fn try_from(repr: RatingsRepr) -> Result<Self, Self::Error> {
        Self::try_new(repr.0, repr.1)
    }
}

impl From<Ratings> for RatingsRepr {
    fn from(ratings: Ratings) -> Self {
        Self(ratings.means, ratings.stddevs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariables {
    #[serde(with = "fixed::normal")]
    pub i: Normal,
    #[serde(with = "fixed::normal")]
    pub h: Normal,
    pub o: Ratings,
    pub d: Ratings,
}

/// Team names with the model variables indexed by team position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelStateRepr")]
pub struct ModelState {
    teams: Vec<String>,
    variables: ModelVariables,
}
impl ModelState {
    pub fn try_new(teams: Vec<String>, variables: ModelVariables) -> Result<Self, InvalidState> {
        for (ratings, actual) in [("offense", variables.o.len()), ("defense", variables.d.len())] {
            if actual != teams.len() {
                return Err(InvalidState::Misaligned {
                    ratings,
                    expected: teams.len(),
                    actual,
                });
            }
        }
        let mut seen = FxHashSet::default();
        for team in &teams {
            if !seen.insert(team.as_str()) {
                return Err(InvalidState::DuplicateTeam(team.clone()));
            }
        }
        Ok(Self { teams, variables })
    }

    /// Priors of a model that has seen no games.
    pub fn cold_start(teams: &[impl AsRef<str>], intercept: Normal, home_advantage: Normal) -> Self {
        Self {
            teams: teams.iter().map(|team| team.as_ref().to_string()).collect(),
            variables: ModelVariables {
                i: intercept,
                h: home_advantage,
                o: teams.iter().map(|_| DEFAULT_TEAM_RATING).collect(),
                d: teams.iter().map(|_| DEFAULT_TEAM_RATING).collect(),
            },
        }
    }

    pub fn teams(&self) -> &[String] {
        &self.teams
    }

    pub fn variables(&self) -> &ModelVariables {
        &self.variables
    }

    pub fn team_index(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|team| team == name)
    }

    pub fn team_state(&self, name: &str) -> Option<TeamState> {
        self.team_index(name).map(|index| TeamState {
            o: self.variables.o.get(index),
            d: self.variables.d.get(index),
        })
    }

    /// Appends a team with the default rating unless it is already present, returning its
    /// position.
    pub fn include(&mut self, name: &str) -> usize {
        match self.team_index(name) {
            Some(index) => index,
            None => {
                warn!(
                    "did not find team {name} in the model state, defaulting to μ={} and σ={}",
                    DEFAULT_TEAM_RATING.mean, DEFAULT_TEAM_RATING.stddev
                );
                self.teams.push(name.to_string());
                self.variables.o.push(DEFAULT_TEAM_RATING);
                self.variables.d.push(DEFAULT_TEAM_RATING);
                self.teams.len() - 1
            }
        }
    }

    /// Copy of this state with every standard deviation scaled by `factor` and capped at `cap`.
    /// Means are unchanged.
    pub fn fattened(&self, factor: f64, cap: f64) -> Self {
        let fatten = |ratings: &Ratings| {
            ratings
                .iter()
                .map(|normal| normal.fattened(factor, cap))
                .collect::<Ratings>()
        };
        Self {
            teams: self.teams.clone(),
            variables: ModelVariables {
                i: self.variables.i.fattened(factor, cap),
                h: self.variables.h.fattened(factor, cap),
                o: fatten(&self.variables.o),
                d: fatten(&self.variables.d),
            },
        }
    }

    pub fn to_league_state(&self) -> LeagueState {
        LeagueState {
            i: self.variables.i,
            h: self.variables.h,
            teams: self
                .teams
                .iter()
                .enumerate()
                .map(|(index, team)| {
                    (
                        team.as_str(),
                        TeamState {
                            o: self.variables.o.get(index),
                            d: self.variables.d.get(index),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Array form of `league_state`, with teams in the order of the league state.
    pub fn from_league_state(league_state: &LeagueState) -> Self {
        Self {
            teams: league_state.teams.names().map(str::to_string).collect(),
            variables: ModelVariables {
                i: league_state.i,
                h: league_state.h,
                o: league_state.teams.iter().map(|(_, team)| team.o).collect(),
                d: league_state.teams.iter().map(|(_, team)| team.d).collect(),
            },
        }
    }

    /// Array form of `league_state` restricted to, and ordered by, `roster`. Teams on the
    /// roster that the league state lacks are given the default rating.
    pub fn with_roster(league_state: &LeagueState, roster: &[impl AsRef<str>]) -> Self {
        let mut o = Ratings::default();
        let mut d = Ratings::default();
        for team in roster {
            let team = team.as_ref();
            let state = league_state.teams.get(team).copied().unwrap_or_else(|| {
                warn!(
                    "did not find team {team} in the league state, defaulting to μ={} and σ={}",
                    DEFAULT_TEAM_RATING.mean, DEFAULT_TEAM_RATING.stddev
                );
                TeamState::default()
            });
            o.push(state.o);
            d.push(state.d);
        }
        Self {
            teams: roster.iter().map(|team| team.as_ref().to_string()).collect(),
            variables: ModelVariables {
                i: league_state.i,
                h: league_state.h,
                o,
                d,
            },
        }
    }

    /// This state carried over to the teams of `roster`, in its order. Used when resuming from
    /// a stored state: teams that have since joined the league start from the default rating,
    /// and teams no longer on the roster are dropped. An empty roster leaves the state as is.
    pub fn reconciled(&self, roster: &[impl AsRef<str>]) -> Self {
        if roster.is_empty() {
            return self.clone();
        }
        Self::with_roster(&self.to_league_state(), roster)
    }
}

#[derive(Deserialize)]
struct ModelStateRepr {
    teams: Vec<String>,
    variables: ModelVariables,
}

impl TryFrom<ModelStateRepr> for ModelState {
    type Error = InvalidState;

    fn try_from(repr: ModelStateRepr) -> Result<Self, Self::Error> {
        Self::try_new(repr.teams, repr.variables)
    }
}
