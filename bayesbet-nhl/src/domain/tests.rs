use assert_float_eq::*;
use serde_json::json;
use strum::IntoEnumIterator;

use super::*;

fn even_percentages() -> WinPercentages {
    let side = TeamWinPercentage {
        regulation: 0.4,
        overtime: 0.05,
        shootout: 0.05,
    };
    WinPercentages::try_new(side, side).unwrap()
}

#[test]
fn game_type_codes() {
    assert_eq!(GameType::PreSeason, GameType::from_code(1));
    assert_eq!(GameType::Regular, GameType::from_code(2));
    assert_eq!(GameType::Playoff, GameType::from_code(3));
    assert_eq!(GameType::AllStar, GameType::from_code(4));
    for code in [6, 7, 8, 12] {
        assert_eq!(GameType::Other, GameType::from_code(code));
    }
    let shootouts = GameType::iter()
        .filter(GameType::has_shootout)
        .collect::<Vec<_>>();
    assert!(!shootouts.contains(&GameType::Playoff));
    assert_eq!(4, shootouts.len());
}

#[test]
fn game_type_names() {
    assert_eq!(json!("Pr"), serde_json::to_value(GameType::PreSeason).unwrap());
    assert_eq!(json!("Other"), serde_json::to_value(GameType::Other).unwrap());
    assert_eq!(GameType::Playoff, serde_json::from_value(json!("P")).unwrap());
    assert_eq!("R", GameType::Regular.to_string());
}

#[test]
fn game_state_feed_codes() {
    assert_eq!(Some(GameState::Final), GameState::from_feed("OFF"));
    assert_eq!(Some(GameState::Final), GameState::from_feed("FINAL"));
    assert_eq!(Some(GameState::Future), GameState::from_feed("FUT"));
    assert_eq!(Some(GameState::Future), GameState::from_feed("LIVE"));
    assert_eq!(Some(GameState::Postponed), GameState::from_feed("PPD"));
    assert_eq!(None, GameState::from_feed("???"));
}

#[test]
fn outcome_home_win() {
    assert_eq!(Ok(true), GameOutcome::Final(Score::new(3, 2)).home_win());
    assert_eq!(Ok(false), GameOutcome::Final(Score::new(1, 4)).home_win());
    assert_eq!(Err(UndeterminedOutcome), GameOutcome::Pending.home_win());
}

#[test]
fn outcome_serialisation() {
    assert_eq!(
        json!({"home_score": "-", "away_score": "-"}),
        serde_json::to_value(GameOutcome::Pending).unwrap()
    );
    assert_eq!(
        json!({"home_score": "4", "away_score": "7"}),
        serde_json::to_value(GameOutcome::Final(Score::new(4, 7))).unwrap()
    );
    assert_eq!(
        GameOutcome::Final(Score::new(5, 0)),
        serde_json::from_value(json!({"home_score": 5, "away_score": "0"})).unwrap()
    );
    assert_eq!(
        GameOutcome::Pending,
        serde_json::from_value(json!({"home_score": "-", "away_score": "-"})).unwrap()
    );
    assert!(serde_json::from_value::<GameOutcome>(json!({"home_score": "-", "away_score": "2"})).is_err());
    assert!(serde_json::from_value::<GameOutcome>(json!({"home_score": "x", "away_score": "2"})).is_err());
}

#[test]
fn score_probabilities_validated() {
    assert!(ScoreProbabilities::try_new(vec![0.1; 10], vec![0.5, 0.5]).is_ok());
    assert_eq!(
        Err(InvalidProbabilities::EmptyScoreProbabilities(Side::Away)),
        ScoreProbabilities::try_new(vec![1.0], vec![])
    );
    let err = ScoreProbabilities::try_new(vec![0.5, 0.49], vec![1.0]).unwrap_err();
    assert!(matches!(err, InvalidProbabilities::ScoreProbabilities { side: Side::Home, .. }), "{err:?}");
    assert!(ScoreProbabilities::try_new(vec![0.5, 0.49995], vec![1.0]).is_ok());
    assert!(ScoreProbabilities::try_new(vec![f64::NAN], vec![1.0]).is_err());
}

#[test]
fn score_probabilities_rejected_on_read() {
    let err = serde_json::from_value::<ScoreProbabilities>(json!({
        "home": ["0.50000", "0.40000"],
        "away": ["1.00000"]
    }))
    .unwrap_err();
    assert!(err.to_string().contains("Home score probabilities sum to"), "{err}");
}

#[test]
fn win_percentages_validated() {
    let even = even_percentages();
    assert_float_absolute_eq!(1.0, even.home().total() + even.away().total(), 1e-15);
    let lopsided = TeamWinPercentage {
        regulation: 0.6,
        ..TeamWinPercentage::default()
    };
    assert_eq!(
        Err(InvalidProbabilities::WinPercentages { actual: 1.2 }),
        WinPercentages::try_new(lopsided, lopsided)
    );
    assert!(serde_json::from_value::<WinPercentages>(json!({
        "home": {"regulation": "0.6", "overtime": "0", "shootout": "0"},
        "away": {"regulation": "0.6", "overtime": "0", "shootout": "0"}
    }))
    .is_err());
}

#[test]
fn prediction_serialisation() {
    let prediction = GamePrediction {
        game_pk: 2023020001,
        home_team: "Boston Bruins".into(),
        away_team: "Chicago Blackhawks".into(),
        outcome: GameOutcome::Pending,
        score_probabilities: ScoreProbabilities::try_new(vec![0.25; 4], vec![0.5, 0.5]).unwrap(),
        win_percentages: even_percentages(),
    };
    let value = serde_json::to_value(&prediction).unwrap();
    assert_eq!(
        json!({
            "game_pk": 2023020001_u64,
            "home_team": "Boston Bruins",
            "away_team": "Chicago Blackhawks",
            "outcome": {"home_score": "-", "away_score": "-"},
            "score_probabilities": {
                "home": ["0.25000", "0.25000", "0.25000", "0.25000"],
                "away": ["0.50000", "0.50000"]
            },
            "win_percentages": {
                "home": {"regulation": "0.40000", "overtime": "0.05000", "shootout": "0.05000"},
                "away": {"regulation": "0.40000", "overtime": "0.05000", "shootout": "0.05000"}
            }
        }),
        value
    );
    let decoded: GamePrediction = serde_json::from_value(value).unwrap();
    assert_eq!(prediction, decoded);
    assert_float_absolute_eq!(0.5, decoded.home_win_probability(), 1e-15);
}

#[test]
fn game_row() {
    let game: Game = serde_json::from_value(json!({
        "game_pk": 2023020005_u64,
        "game_date": "2023-10-11",
        "season": 20232024,
        "game_type": "R",
        "game_state": "Final",
        "home_team": "Boston Bruins",
        "away_team": "Chicago Blackhawks",
        "home_reg_score": 2,
        "away_reg_score": 2,
        "home_fin_score": 3,
        "away_fin_score": 2
    }))
    .unwrap();
    assert!(game.is_final());
    assert!(!game.is_postponed());
    assert!(game.home_won());
    assert_eq!(Score::new(2, 2), game.regulation_score());
    assert_eq!(Score::new(3, 2), game.final_score());
    assert_eq!(NaiveDate::from_ymd_opt(2023, 10, 11), Some(game.game_date));
}
