use stanza::style::HAlign::Left;
use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::domain::{GameOutcome, GamePrediction, PredictionPerformance};
use crate::state::{LeagueState, TeamState};

pub fn tabulate_predictions(predictions: &[GamePrediction]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Game".into(),
                "Home".into(),
                "Away".into(),
                "Home".into(),
                "Reg".into(),
                "OT".into(),
                "SO".into(),
                "Score".into(),
            ],
        ));
    for prediction in predictions {
        let home = prediction.win_percentages.home();
        let score = match prediction.outcome {
            GameOutcome::Pending => "-".to_string(),
            GameOutcome::Final(score) => format!("{}–{}", score.home, score.away),
        };
        table.push_row(Row::new(
            Styles::default(),
            vec![
                prediction.game_pk.to_string().into(),
                prediction.home_team.clone().into(),
                prediction.away_team.clone().into(),
                format!("{:.3}", home.total()).into(),
                format!("{:.3}", home.regulation).into(),
                format!("{:.3}", home.overtime).into(),
                format!("{:.3}", home.shootout).into(),
                score.into(),
            ],
        ));
    }
    table
}

pub fn tabulate_performance(performance: &[PredictionPerformance]) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(10)).with(Left)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Date".into(),
                "Games".into(),
                "Accuracy".into(),
                "Log loss".into(),
                "Rolling accuracy".into(),
                "Rolling log loss".into(),
            ],
        ));
    for row in performance {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                row.prediction_date.to_string().into(),
                row.total_games.to_string().into(),
                format!("{:.3}", row.cumulative_accuracy).into(),
                format!("{:.4}", row.cumulative_log_loss).into(),
                format!("{:.3}", row.rolling_accuracy).into(),
                format!("{:.4}", row.rolling_log_loss).into(),
            ],
        ));
    }
    table
}

/// Teams ranked by the sum of their offense and defense ratings, strongest first.
pub fn tabulate_league_state(league_state: &LeagueState) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(20)).with(Left)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(8)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec!["Team".into(), "O μ".into(), "O σ".into(), "D μ".into(), "D σ".into()],
        ));
    let mut teams = league_state.teams.iter().collect::<Vec<_>>();
    teams.sort_by(|(_, a), (_, b)| {
        let strength = |team: &TeamState| team.o.mean + team.d.mean;
        strength(b).total_cmp(&strength(a))
    });
    for (name, team) in teams {
        table.push_row(Row::new(
            Styles::default(),
            vec![
                name.to_string().into(),
                format!("{:.4}", team.o.mean).into(),
                format!("{:.4}", team.o.stddev).into(),
                format!("{:.4}", team.d.mean).into(),
                format!("{:.4}", team.d.stddev).into(),
            ],
        ));
    }
    table.push_row(Row::new(
        Styles::default(),
        vec![
            "intercept".into(),
            format!("{:.4}", league_state.i.mean).into(),
            format!("{:.4}", league_state.i.stddev).into(),
            "".into(),
            "".into(),
        ],
    ));
    table.push_row(Row::new(
        Styles::default(),
        vec![
            "home advantage".into(),
            format!("{:.4}", league_state.h.mean).into(),
            format!("{:.4}", league_state.h.stddev).into(),
            "".into(),
            "".into(),
        ],
    ));
    table
}
