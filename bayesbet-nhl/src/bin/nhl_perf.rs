use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use bayesbet::file::ReadJsonFile;
use bayesbet_nhl::domain::{Game, PredictionRecord};
use bayesbet_nhl::evaluate::{accuracy, log_loss, prediction_performance, DEFAULT_WINDOW};
use bayesbet_nhl::print::tabulate_performance;

/// Scores published predictions against the actual results.
#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// JSON array of the season's games, used to fill in pending outcomes
    #[clap(short = 'g', long)]
    games: Option<PathBuf>,

    /// rolling window of the performance statistics, in prediction dates
    #[clap(short = 'w', long, default_value_t = DEFAULT_WINDOW)]
    window: usize,

    /// prediction records to score
    records: Vec<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.records.is_empty() {
            bail!("at least one prediction record must be specified");
        }
        if self.window == 0 {
            bail!("window must span at least one date");
        }
        Ok(())
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

    let games = match &args.games {
        Some(path) => Vec::<Game>::read_json_file(path)?,
        None => vec![],
    };
    let history = args
        .records
        .iter()
        .map(|path| PredictionRecord::read_json_file(path))
        .collect::<Result<Vec<_>, _>>()?;
    info!("loaded {} prediction records", history.len());

    let performance = prediction_performance(&history, &games, args.window)?;
    println!("{}", Console::default().render(&tabulate_performance(&performance)));

    let scored = history
        .iter()
        .flat_map(|record| &record.predictions)
        .filter(|prediction| !prediction.outcome.is_pending())
        .cloned()
        .collect::<Vec<_>>();
    if scored.is_empty() {
        info!("none of the predicted games have concluded");
    } else {
        info!(
            "{} concluded games without backfill: accuracy {:.3}, log loss {:.4}",
            scored.len(),
            accuracy(&scored)?,
            log_loss(&scored)?
        );
    }
    Ok(())
}
