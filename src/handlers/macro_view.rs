// src/handlers/macro_view.rs
use log::{debug, error, info, warn};
use std::collections::BTreeMap;

use crate::handlers::error::AnalysisError;
use crate::models::{CliReading, Country, MacroData, MacroView};
use crate::services::bond_risk::assess_bond_risk;
use crate::services::macro_trend::{classify_cli_trend, latest_three, latest_value};
use crate::services::sources::MacroSource;

const COUNTRIES: [Country; 2] = [Country::Us, Country::Kr];

/// Bond risk and CLI regimes from already fetched macro series.
pub fn build_macro_view(data: &MacroData) -> MacroView {
    let yield_spread = latest_value(&data.yield_spread);
    let high_yield_spread = latest_value(&data.high_yield_spread);
    let bond_risk = assess_bond_risk(yield_spread, high_yield_spread);
    debug!(
        "Yield spread {:?}, high-yield spread {:?} -> {:?}",
        yield_spread, high_yield_spread, bond_risk
    );

    let mut cli = BTreeMap::new();
    for country in COUNTRIES {
        let readings = data.cli.get(&country).map(Vec::as_slice).unwrap_or(&[]);
        let reading = latest_three(readings).map(|(curr, prev, pprev)| CliReading {
            latest: curr,
            trend: classify_cli_trend(curr, prev, pprev),
        });
        if reading.is_none() {
            warn!("Fewer than three usable CLI readings for {}", country);
        }
        cli.insert(country, reading);
    }

    MacroView {
        yield_spread,
        high_yield_spread,
        bond_risk,
        cli,
    }
}

pub fn get_macro_view(source: &dyn MacroSource) -> Result<MacroView, AnalysisError> {
    info!("Handling request for the macro view");
    let data = source.fetch_macro().map_err(|e| {
        error!("Failed to fetch macro data: {}", e);
        AnalysisError::source_error(format!("Failed to fetch macro data: {}", e))
    })?;
    Ok(build_macro_view(&data))
}

pub fn render_macro_view(view: &MacroView) -> String {
    let fmt_opt = |v: Option<f64>, unit: &str| match v {
        Some(v) => format!("{:.2}{}", v, unit),
        None => "-".to_string(),
    };

    let mut out = String::new();
    out.push_str(&format!("10Y-2Y spread:      {}\n", fmt_opt(view.yield_spread, "%p")));
    out.push_str(&format!("High-yield spread:  {}\n", fmt_opt(view.high_yield_spread, "%")));
    for (country, reading) in &view.cli {
        match reading {
            Some(r) => out.push_str(&format!(
                "{} CLI:             {:.2} {}\n",
                country, r.latest, r.trend
            )),
            None => out.push_str(&format!("{} CLI:             - (unavailable)\n", country)),
        }
    }
    out.push_str(&format!("Bond market:        {}\n", view.bond_risk.describe()));
    out
}
