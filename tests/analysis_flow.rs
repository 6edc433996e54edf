// tests/analysis_flow.rs
use approx::assert_relative_eq;
use chrono::NaiveDate;
use std::path::PathBuf;

use eps_momentum_dashboard::config::Config;
use eps_momentum_dashboard::models::{BondRisk, Country, QuarterKey, RejectReason, TrendLabel};
use eps_momentum_dashboard::routes::{dispatch, Command};
use eps_momentum_dashboard::services::forward_eps::forward_eps_series;
use eps_momentum_dashboard::services::sources::{EpsSource, FileSource};
use eps_momentum_dashboard::services::ticker::{load_krx_listing, resolve_ticker};

fn data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data")
}

fn config_for(dir: PathBuf) -> Config {
    Config::from_vars(Some(dir.to_string_lossy().into_owned()), None, None).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
}

fn key(year: i32, quarter: u8) -> QuarterKey {
    QuarterKey::new(year, quarter).unwrap()
}

#[test]
fn consolidated_table_merges_with_quarterly_priority() {
    let listing = load_krx_listing(&data_dir().join("krx_listing.csv")).unwrap();
    let ticker = resolve_ticker("Samsung Electronics", &listing);
    assert_eq!(ticker.ticker, "005930.KS");
    assert_eq!(ticker.country, Country::Kr);

    let snapshot = FileSource::new(data_dir()).fetch_eps(&ticker, today()).unwrap();
    let map = &snapshot.build.map;
    assert_eq!(map[&key(2026, 1)], 1900.0);
    assert_eq!(map[&key(2026, 2)], 2050.0);
    assert_eq!(map[&key(2026, 3)], 2000.0);
    assert_eq!(map[&key(2026, 4)], 2300.0);
    assert_eq!(map[&key(2027, 1)], 2400.0);

    let reasons: Vec<RejectReason> = snapshot.build.rejected.iter().map(|r| r.reason).collect();
    assert_eq!(reasons.len(), 4);
    assert!(reasons.contains(&RejectReason::BlendedAggregate));
    assert!(reasons.contains(&RejectReason::MissingValue));
    assert!(reasons.contains(&RejectReason::UnparseableValue));
    assert!(reasons.contains(&RejectReason::UnparseableTag));
    assert_eq!(snapshot.overview.len(), 8);

    let series = forward_eps_series(map, today());
    assert_eq!(series.len(), 13);
    assert_relative_eq!(series.latest().unwrap().value, 9500.0, epsilon = 1e-6);
}

#[test]
fn separate_sources_resolve_relative_estimates() {
    let ticker = resolve_ticker("apple", &[]);
    let snapshot = FileSource::new(data_dir()).fetch_eps(&ticker, today()).unwrap();
    let map = &snapshot.build.map;

    assert_eq!(map[&key(2026, 1)], 2.40);
    assert_eq!(map[&key(2026, 4)], 1.95);
    assert_eq!(map[&key(2027, 1)], 2.60);
    assert_relative_eq!(map[&key(2027, 2)], 2.10, epsilon = 1e-12);
    assert!(!map.contains_key(&key(2025, 3)));
    assert_eq!(snapshot.overview.len(), 5);

    let series = forward_eps_series(map, today());
    assert_relative_eq!(series.points[0].value, 7.62, epsilon = 1e-9);
    assert_relative_eq!(series.latest().unwrap().value, 8.75, epsilon = 1e-9);
}

#[test]
fn dispatch_analyze_produces_json_reports() {
    let config = Config::from_vars(
        Some(data_dir().to_string_lossy().into_owned()),
        Some("UTC".into()),
        None,
    )
    .unwrap();
    let command = Command::Analyze {
        queries: vec!["apple".into(), "Samsung Electronics".into()],
        today: Some(today()),
        json: true,
    };

    let output = dispatch(command, &config).unwrap();
    let reports: serde_json::Value = serde_json::from_str(&output).unwrap();
    let reports = reports.as_array().unwrap();
    assert_eq!(reports.len(), 2);

    assert_eq!(reports[0]["ticker"]["ticker"], "AAPL");
    assert_eq!(reports[0]["bond_risk"], "recession_warning");
    assert_eq!(reports[0]["cli_trend"]["label"], "expansion_decelerating");
    assert_eq!(reports[0]["trend"]["points"].as_array().unwrap().len(), 13);

    assert_eq!(reports[1]["ticker"]["ticker"], "005930.KS");
    assert_eq!(reports[1]["cli_trend"]["label"], "recovery_accelerating");
    assert!(reports[1]["prompt"].as_str().unwrap().contains("recovery accelerating"));
}

#[test]
fn dispatch_macro_renders_both_countries() {
    let config = config_for(data_dir());
    let text = dispatch(Command::Macro { json: false }, &config).unwrap();
    assert!(text.contains("US CLI"));
    assert!(text.contains("KR CLI"));
    assert!(text.contains(BondRisk::RecessionWarning.describe()));
    assert!(text.contains(TrendLabel::ExpansionDecelerating.describe()));
}

#[test]
fn unknown_ticker_is_a_source_error() {
    let config = config_for(data_dir());
    let command = Command::Analyze {
        queries: vec!["NOPE".into()],
        today: Some(today()),
        json: false,
    };
    let err = dispatch(command, &config).unwrap_err();
    assert!(err.message.contains("NOPE"));
}

#[test]
fn analysis_runs_without_macro_data() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/no_macro");
    let command = Command::Analyze {
        queries: vec!["apple".into()],
        today: Some(today()),
        json: true,
    };

    let output = dispatch(command, &config_for(dir)).unwrap();
    let reports: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(reports[0]["ticker"]["ticker"], "AAPL");
    assert_eq!(reports[0]["bond_risk"], "stable");
    assert!(reports[0]["cli_trend"].is_null());
}

#[test]
fn one_unknown_ticker_keeps_other_reports() {
    let command = Command::Analyze {
        queries: vec!["apple".into(), "NOPE".into(), "Samsung Electronics".into()],
        today: Some(today()),
        json: false,
    };
    let text = dispatch(command, &config_for(data_dir())).unwrap();
    assert_eq!(text.matches("12M Fwd EPS").count(), 2);
    assert!(text.contains("Error: No EPS data for 'NOPE'"));
}
