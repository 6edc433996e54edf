// src/routes.rs
use chrono::NaiveDate;
use log::{error, info, warn};

use crate::config::Config;
use crate::handlers::analysis::{analyze_company, render_report, AnalysisContext};
use crate::handlers::error::AnalysisError;
use crate::handlers::macro_view::{build_macro_view, get_macro_view, render_macro_view};
use crate::models::{MacroData, MacroView};
use crate::services::sources::{CachedEpsSource, CachedMacroSource, FileSource, MacroSource};
use crate::services::ticker::{load_krx_listing, ListedCompany};

const KRX_LISTING_FILE: &str = "krx_listing.csv";

pub const USAGE: &str = "usage:
  eps-dashboard macro [--json]
  eps-dashboard analyze <name-or-ticker>... [--today YYYY-MM-DD] [--json]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Macro { json: bool },
    Analyze { queries: Vec<String>, today: Option<NaiveDate>, json: bool },
}

pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<Command, AnalysisError> {
    let mut args = args.into_iter();
    let name = args
        .next()
        .ok_or_else(|| AnalysisError::invalid_input(USAGE))?;

    let mut json = false;
    let mut today = None;
    let mut queries = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--today" => {
                let raw = args
                    .next()
                    .ok_or_else(|| AnalysisError::invalid_input("--today needs a date"))?;
                let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| {
                    AnalysisError::invalid_input(format!(
                        "--today '{}' is not YYYY-MM-DD: {}",
                        raw, e
                    ))
                })?;
                today = Some(date);
            }
            _ => queries.push(arg),
        }
    }

    match name.as_str() {
        "macro" => Ok(Command::Macro { json }),
        "analyze" if !queries.is_empty() => Ok(Command::Analyze { queries, today, json }),
        _ => Err(AnalysisError::invalid_input(USAGE)),
    }
}

fn load_listing(config: &Config) -> Vec<ListedCompany> {
    match load_krx_listing(&config.data_dir.join(KRX_LISTING_FILE)) {
        Ok(listing) => listing,
        Err(e) => {
            warn!("KRX listing unavailable, Korean names will not resolve: {}", e);
            Vec::new()
        }
    }
}

/// Company analysis still runs without macro data; bond risk then reads
/// stable and both CLI trends are unavailable.
fn macro_view_or_empty(source: &dyn MacroSource) -> MacroView {
    get_macro_view(source).unwrap_or_else(|e| {
        warn!("Continuing without macro data: {}", e);
        build_macro_view(&MacroData::default())
    })
}

/// Run one command and return what should be printed.
pub fn dispatch(command: Command, config: &Config) -> Result<String, AnalysisError> {
    let files = FileSource::new(config.data_dir.clone());
    let macro_source = CachedMacroSource::new(files.clone(), config.cache_ttl);

    match command {
        Command::Macro { json } => {
            let view = get_macro_view(&macro_source)?;
            if json {
                to_json(&view)
            } else {
                Ok(render_macro_view(&view))
            }
        }
        Command::Analyze { queries, today, json } => {
            let today = today.unwrap_or_else(|| config.today());
            info!("Analyzing {} companies as of {}", queries.len(), today);

            let eps_source = CachedEpsSource::new(files, config.cache_ttl);
            let listing = load_listing(config);
            let ctx = AnalysisContext {
                eps_source: &eps_source,
                listing: &listing,
                narrative: None,
            };

            let view = macro_view_or_empty(&macro_source);
            let mut reports = Vec::new();
            let mut failures = Vec::new();
            for query in &queries {
                match analyze_company(&ctx, query, &view, today) {
                    Ok(report) => reports.push(report),
                    Err(e) => {
                        error!("Analysis of '{}' failed: {}", query, e);
                        failures.push(e);
                    }
                }
            }
            if reports.is_empty() && !failures.is_empty() {
                return Err(failures.swap_remove(0));
            }

            if json {
                to_json(&reports)
            } else {
                let mut sections: Vec<String> = reports.iter().map(render_report).collect();
                sections.extend(failures.iter().map(|e| format!("Error: {}\n", e.message)));
                Ok(sections.join("\n"))
            }
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AnalysisError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| AnalysisError::invalid_input(format!("Failed to encode report: {}", e)))
}
