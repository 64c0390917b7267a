use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use chrono::NaiveDate;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use bayesbet::file::{ReadJsonFile, WriteJsonFile};
use bayesbet::mcmc::HmcConfig;
use bayesbet_nhl::data::{filter_league_games, game_dates, games_on, regular_season_teams};
use bayesbet_nhl::domain::{Game, ModelStateRecord, PredictionRecord};
use bayesbet_nhl::evaluate::{prediction_performance, update_scores, DEFAULT_WINDOW};
use bayesbet_nhl::model::inference::HmcSampler;
use bayesbet_nhl::model::{Config, IterativeUpdateModel};
use bayesbet_nhl::print::{tabulate_league_state, tabulate_performance, tabulate_predictions};
use bayesbet_nhl::state::{ModelState, COLD_START_HOME_ADVANTAGE, COLD_START_INTERCEPT};

const LEAGUE: &str = "nhl";

/// Brings the model up to date with the results before a date and predicts the games on it.
#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// JSON array of the season's games
    #[clap(short = 'g', long)]
    games: PathBuf,

    /// date to predict (YYYY-MM-DD)
    #[clap(short = 'd', long)]
    date: NaiveDate,

    /// model state record to resume from; the model starts cold if omitted
    #[clap(short = 's', long)]
    state: Option<PathBuf>,

    /// earlier prediction records, scored against the games to track performance
    #[clap(long)]
    history: Vec<PathBuf>,

    /// directory that receives the prediction and state records
    #[clap(short = 'o', long, default_value = ".")]
    out: PathBuf,

    /// posterior draws per chain
    #[clap(long, default_value = "5000")]
    samples: usize,

    /// tuning iterations per chain
    #[clap(long, default_value = "2000")]
    tune: usize,

    /// independent chains
    #[clap(long, default_value = "3")]
    chains: usize,

    /// seed of the first chain
    #[clap(long, default_value = "0")]
    seed: u64,

    /// rolling window of the performance statistics, in prediction dates
    #[clap(long, default_value_t = DEFAULT_WINDOW)]
    window: usize,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.out.is_dir() {
            bail!("output directory {} does not exist", self.out.display());
        }
        self.hmc_config().validate()?;
        Ok(())
    }

    fn hmc_config(&self) -> HmcConfig {
        HmcConfig {
            samples: self.samples,
            tune: self.tune,
            chains: self.chains,
            seed: self.seed,
            ..HmcConfig::default()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    let games = filter_league_games(&Vec::<Game>::read_json_file(&args.games)?);
    info!("loaded {} league games", games.len());

    let teams = regular_season_teams(&games);
    let (priors, resume_date) = match &args.state {
        Some(path) => {
            let record = ModelStateRecord::read_json_file(path)?;
            info!(
                "resuming from the state of {} with {} teams",
                record.prediction_date,
                teams.len()
            );
            (record.state.reconciled(&teams), Some(record.prediction_date))
        }
        None => {
            info!("cold start with {} teams", teams.len());
            let priors = ModelState::cold_start(
                teams.as_slice(),
                COLD_START_INTERCEPT,
                COLD_START_HOME_ADVANTAGE,
            );
            (priors, None)
        }
    };

    let sampler = HmcSampler::new(args.hmc_config());
    let mut model = IterativeUpdateModel::try_new(Config::default(), priors, sampler)?;
    for date in game_dates(&games)
        .into_iter()
        .filter(|&date| resume_date.map_or(true, |resume| date >= resume) && date < args.date)
    {
        let results = games_on(&games, date);
        info!("fitting {} games of {date}", results.len());
        model.fit(&results)?;
    }

    let predictions = model.predict(&games_on(&games, args.date))?;
    let league_state = model.priors().to_league_state();

    let history = args
        .history
        .iter()
        .map(|path| {
            PredictionRecord::read_json_file(path).map(|record| update_scores(&record, &games))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let performance = prediction_performance(&history, &games, args.window)?;
    for record in &history {
        let path = args.out.join(format!("predictions-{}.json", record.prediction_date));
        record.write_json_file(path)?;
    }

    let record = PredictionRecord {
        league: LEAGUE.into(),
        prediction_date: args.date,
        deployment_version: env!("CARGO_PKG_VERSION").into(),
        league_state: league_state.clone(),
        predictions,
        prediction_performance: performance,
    };
    info!(
        "league state:\n{}",
        Console::default().render(&tabulate_league_state(&league_state))
    );
    info!(
        "predictions for {}:\n{}",
        args.date,
        Console::default().render(&tabulate_predictions(&record.predictions))
    );
    if !record.prediction_performance.is_empty() {
        info!(
            "performance:\n{}",
            Console::default().render(&tabulate_performance(&record.prediction_performance))
        );
    }

    let predictions_path = args.out.join(format!("predictions-{}.json", args.date));
    record.write_json_file(&predictions_path)?;

    let state_path = args.out.join(format!("state-{}.json", args.date));
    ModelStateRecord {
        league: LEAGUE.into(),
        prediction_date: args.date,
        state: model.into_priors(),
    }
    .write_json_file(&state_path)?;
    info!(
        "wrote {} and {}",
        predictions_path.display(),
        state_path.display()
    );
    Ok(())
}
