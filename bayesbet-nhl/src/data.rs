//! Selection of games from a season's schedule, and parsing of the league's schedule feed.

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Game, GameState, GameType};
use crate::roster;

/// Retains the games between teams of the roster, dropping all-star and exhibition games.
pub fn filter_league_games(games: &[Game]) -> Vec<Game> {
    games
        .iter()
        .filter(|game| !matches!(game.game_type, GameType::AllStar | GameType::Other))
        .filter(|game| roster::contains(&game.home_team) && roster::contains(&game.away_team))
        .cloned()
        .collect()
}

/// Teams that appear in regular-season games, in alphabetical order.
pub fn regular_season_teams(games: &[Game]) -> Vec<String> {
    let mut teams = games
        .iter()
        .filter(|game| game.game_type == GameType::Regular)
        .flat_map(|game| [game.home_team.clone(), game.away_team.clone()])
        .collect::<Vec<_>>();
    teams.sort_unstable();
    teams.dedup();
    teams
}

/// Distinct game dates, in ascending order.
pub fn game_dates(games: &[Game]) -> Vec<NaiveDate> {
    let mut dates = games.iter().map(|game| game.game_date).collect::<Vec<_>>();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Games scheduled on `date`, excluding those that were postponed.
pub fn games_on(games: &[Game], date: NaiveDate) -> Vec<Game> {
    games
        .iter()
        .filter(|game| game.game_date == date && !game.is_postponed())
        .cloned()
        .collect()
}

/// The latest game date strictly before `date`.
pub fn previous_game_date(games: &[Game], date: NaiveDate) -> Option<NaiveDate> {
    games
        .iter()
        .map(|game| game.game_date)
        .filter(|&game_date| game_date < date)
        .max()
}

#[derive(Debug, Error)]
pub enum DataError {
    #[error("malformed schedule: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("game {game_pk} has unrecognised state {state}")]
    UnknownGameState { game_pk: u64, state: String },

    #[error("game {game_pk} is contested by unknown team {abbrev}")]
    UnknownTeam { game_pk: u64, abbrev: String },
}

/// One day of the league's schedule feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    pub previous_game_date: Option<NaiveDate>,
    pub next_game_date: Option<NaiveDate>,
    pub games: Vec<Game>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedSchedule {
    prev_date: Option<NaiveDate>,
    next_date: Option<NaiveDate>,
    games: Vec<FeedGame>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedGame {
    id: u64,
    season: u32,
    game_type: u32,
    game_date: NaiveDate,
    game_state: String,
    home_team: FeedTeam,
    away_team: FeedTeam,
    game_outcome: Option<FeedOutcome>,
}

#[derive(Deserialize)]
struct FeedTeam {
    abbrev: String,
    score: Option<u16>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedOutcome {
    last_period_type: String,
}

/// Parses a day of the schedule feed. Team abbreviations are replaced by full names; an
/// unknown team is an error only in regular-season and playoff games. The winner of a game
/// decided in overtime or a shootout is credited with one goal fewer in regulation.
pub fn parse_schedule(json: &str) -> Result<Schedule, DataError> {
    let feed: FeedSchedule = serde_json::from_str(json)?;
    let games = feed
        .games
        .into_iter()
        .map(into_game)
        .collect::<Result<_, _>>()?;
    Ok(Schedule {
        previous_game_date: feed.prev_date,
        next_game_date: feed.next_date,
        games,
    })
}

fn into_game(game: FeedGame) -> Result<Game, DataError> {
    let game_pk = game.id;
    let game_type = GameType::from_code(game.game_type);
    let game_state =
        GameState::from_feed(&game.game_state).ok_or_else(|| DataError::UnknownGameState {
            game_pk,
            state: game.game_state.clone(),
        })?;
    let team_name = |abbrev: String| match roster::name_of(&abbrev) {
        Some(name) => Ok(name.to_string()),
        None if matches!(game_type, GameType::Regular | GameType::Playoff) => {
            Err(DataError::UnknownTeam { game_pk, abbrev })
        }
        None => Ok(abbrev),
    };

    let (home_fin_score, away_fin_score) = match (game.home_team.score, game.away_team.score) {
        (Some(home), Some(away)) => (home, away),
        _ => (0, 0),
    };
    let (mut home_reg_score, mut away_reg_score) = (home_fin_score, away_fin_score);
    if let Some(outcome) = &game.game_outcome {
        if matches!(outcome.last_period_type.as_str(), "OT" | "SO") {
            if home_fin_score > away_fin_score {
                home_reg_score -= 1;
            } else if away_fin_score > home_fin_score {
                away_reg_score -= 1;
            }
        }
    }

    Ok(Game {
        game_pk,
        game_date: game.game_date,
        season: game.season,
        game_type,
        game_state,
        home_team: team_name(game.home_team.abbrev)?,
        away_team: team_name(game.away_team.abbrev)?,
        home_reg_score,
        away_reg_score,
        home_fin_score,
        away_fin_score,
    })
}
