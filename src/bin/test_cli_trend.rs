// src/bin/test_cli_trend.rs
use anyhow::{bail, Context, Result};
use env_logger;
use log::info;
use std::env;

use eps_momentum_dashboard::services::macro_trend::{classify_cli_trend, CLI_NEUTRAL_LINE};

fn main() -> Result<()> {
    env_logger::init();

    let values: Vec<f64> = env::args()
        .skip(1)
        .map(|a| a.parse::<f64>().with_context(|| format!("'{}' is not a number", a)))
        .collect::<Result<_>>()?;
    if values.len() != 3 {
        bail!("usage: test_cli_trend <curr> <prev> <pprev>");
    }

    let (curr, prev, pprev) = (values[0], values[1], values[2]);
    info!("Neutral line: {}", CLI_NEUTRAL_LINE);
    info!("diff_now = {:.3}, diff_prev = {:.3}", curr - prev, prev - pprev);

    let trend = classify_cli_trend(curr, prev, pprev);
    println!("{}", trend);
    Ok(())
}
