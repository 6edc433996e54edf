// src/handlers/analysis.rs
use chrono::NaiveDate;
use log::{error, info, warn};

use crate::handlers::error::AnalysisError;
use crate::models::{AnalysisReport, MacroView, ResolvedTicker};
use crate::services::calculations::{format_acceleration, format_growth, series_momentum};
use crate::services::forward_eps::forward_eps_series;
use crate::services::narrative::{build_prompt, request_opinion, NarrativeContext, NarrativeModel};
use crate::services::sources::EpsSource;
use crate::services::ticker::{resolve_ticker, ListedCompany};

/// Collaborators a company analysis needs.
pub struct AnalysisContext<'a> {
    pub eps_source: &'a dyn EpsSource,
    pub listing: &'a [ListedCompany],
    pub narrative: Option<&'a dyn NarrativeModel>,
}

/// Full single-company analysis against an already built macro view.
pub fn analyze_company(
    ctx: &AnalysisContext,
    query: &str,
    macro_view: &MacroView,
    today: NaiveDate,
) -> Result<AnalysisReport, AnalysisError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AnalysisError::invalid_input("Empty company name or ticker"));
    }

    let ticker: ResolvedTicker = resolve_ticker(query, ctx.listing);
    info!(
        "Resolved '{}' to {} ({}, {})",
        query, ticker.ticker, ticker.display_name, ticker.country
    );

    let snapshot = ctx.eps_source.fetch_eps(&ticker, today).map_err(|e| {
        error!("Failed to fetch EPS data for {}: {}", ticker.ticker, e);
        AnalysisError::source_error(format!("No EPS data for '{}': {}", query, e))
    })?;

    for rejected in &snapshot.build.rejected {
        warn!("{}: skipped {} ({:?})", ticker.ticker, rejected.source, rejected.reason);
    }

    let trend = forward_eps_series(&snapshot.build.map, today);
    let momentum = series_momentum(&trend).ok_or_else(|| {
        AnalysisError::no_data(format!("Could not find forward EPS data for '{}'", query))
    })?;
    info!(
        "{}: fwd EPS {:.2}, growth {}, accel {}, signal {:?}",
        ticker.ticker,
        momentum.forward_eps,
        format_growth(momentum.growth_now),
        format_acceleration(momentum.acceleration),
        momentum.signal
    );

    let cli_trend = macro_view
        .cli
        .get(&ticker.country)
        .copied()
        .flatten()
        .map(|reading| reading.trend);
    let cli_message = match cli_trend {
        Some(trend) => trend.label.describe().to_string(),
        None => "unavailable".to_string(),
    };

    let prompt = build_prompt(&NarrativeContext {
        ticker: ticker.ticker.clone(),
        display_name: ticker.display_name.clone(),
        forward_eps: momentum.forward_eps,
        growth: format_growth(momentum.growth_now),
        acceleration: format_acceleration(momentum.acceleration),
        bond_message: macro_view.bond_risk.describe().to_string(),
        cli_message,
        signal_message: momentum.signal.describe().to_string(),
    });
    let opinion = request_opinion(ctx.narrative, &prompt);

    Ok(AnalysisReport {
        ticker,
        today,
        trend,
        momentum,
        bond_risk: macro_view.bond_risk,
        cli_trend,
        overview: snapshot.overview,
        rejected: snapshot.build.rejected,
        prompt,
        opinion,
    })
}

pub fn render_report(report: &AnalysisReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} ({}) as of {}\n",
        report.ticker.display_name, report.ticker.ticker, report.today
    ));
    out.push_str(&format!("12M Fwd EPS:   {:.2}\n", report.momentum.forward_eps));
    out.push_str(&format!("Growth:        {}\n", format_growth(report.momentum.growth_now)));
    out.push_str(&format!(
        "Acceleration:  {}\n",
        format_acceleration(report.momentum.acceleration)
    ));
    out.push_str(&format!("Signal:        {}\n", report.momentum.signal.describe()));
    out.push_str(&format!("Bond market:   {}\n", report.bond_risk.describe()));
    match &report.cli_trend {
        Some(trend) => out.push_str(&format!("CLI trend:     {}\n", trend)),
        None => out.push_str("CLI trend:     unavailable\n"),
    }

    out.push_str("\n12M forward EPS trend\n");
    for point in &report.trend.points {
        let marker = if point.has_coverage() { "" } else { "  (insufficient data)" };
        out.push_str(&format!(
            "  {}  {:>12.2}{}\n",
            point.month_end.format("%Y.%m"),
            point.value,
            marker
        ));
    }

    if !report.overview.is_empty() {
        out.push_str("\nSource figures\n");
        for figure in &report.overview {
            out.push_str(&format!("  {:<24} {:>12.2}\n", figure.label, figure.value));
        }
    }

    out.push_str("\nOpinion\n");
    out.push_str(&report.opinion);
    out.push('\n');
    out
}
