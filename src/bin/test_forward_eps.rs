// src/bin/test_forward_eps.rs
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use dotenv::dotenv;
use env_logger;
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use eps_momentum_dashboard::config::Config;
use eps_momentum_dashboard::services::calculations::{
    format_acceleration, format_growth, series_momentum,
};
use eps_momentum_dashboard::services::consensus_csv::load_consensus_csv;
use eps_momentum_dashboard::services::forward_eps::forward_eps_series;
use eps_momentum_dashboard::services::quarter_map::build_from_consolidated;

fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: test_forward_eps <consensus.csv> [YYYY-MM-DD]");
    };
    let today = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("'{}' is not YYYY-MM-DD", raw))?,
        None => Config::from_env()?.today(),
    };

    let cells = load_consensus_csv(&PathBuf::from(&path)).map_err(|e| anyhow::anyhow!(e))?;
    let build = build_from_consolidated(&cells);
    info!("{} quarters, {} rejected cells", build.map.len(), build.rejected.len());
    for rejected in &build.rejected {
        warn!("Skipped {} ({:?})", rejected.source, rejected.reason);
    }

    let series = forward_eps_series(&build.map, today);
    for point in &series.points {
        println!(
            "{}  {:>12.2}  ({} months)",
            point.month_end.format("%Y.%m"),
            point.value,
            point.months_covered
        );
    }

    match series_momentum(&series) {
        Some(m) => println!(
            "growth {}  accel {}  -> {}",
            format_growth(m.growth_now),
            format_acceleration(m.acceleration),
            m.signal.describe()
        ),
        None => println!("insufficient data"),
    }
    Ok(())
}
