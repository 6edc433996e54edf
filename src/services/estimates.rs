// src/services/estimates.rs
//
// Consensus providers quote estimates relative to "now" ("0y", "+1q", ...).
// These helpers pin them to calendar years and quarters.
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::models::{QuarterKey, RejectReason, RejectedEntry};
use crate::services::quarter_map::SeparateSources;

const ANNUAL_TERMS: [(&str, i32); 3] = [("0y", 0), ("+1y", 1), ("+5y", 5)];

/// One realized quarterly result, dated by its report date.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReportedEps {
    pub date: NaiveDate,
    pub eps_actual: Option<f64>,
}

/// Realized history plus relative-term estimates as a provider returns them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EstimateSheet {
    #[serde(default)]
    pub history: Vec<ReportedEps>,
    /// Keys like `0y`, `+1y`, `+5y`, `0q`, `+1q`.
    #[serde(default)]
    pub estimates: BTreeMap<String, f64>,
}

/// Pin an [`EstimateSheet`] to calendar quarters as of `today`.
pub fn resolve_sheet(
    sheet: &EstimateSheet,
    today: NaiveDate,
) -> (SeparateSources, Vec<RejectedEntry>) {
    let mut sources = SeparateSources::default();
    let mut rejected = Vec::new();

    for report in &sheet.history {
        let Some(eps) = report.eps_actual else {
            continue;
        };
        let source = format!("actual {}={}", report.date, eps);
        if !eps.is_finite() {
            rejected.push(RejectedEntry::new(source, RejectReason::NonFinite));
            continue;
        }
        match QuarterKey::from_month(report.date.year(), report.date.month()) {
            Some(key) => {
                sources.actuals.insert(key, eps);
            }
            None => rejected.push(RejectedEntry::new(source, RejectReason::OutOfRange)),
        }
    }

    let current_quarter = QuarterKey::from_month(today.year(), today.month());

    for (term, &value) in &sheet.estimates {
        let source = format!("estimate {}={}", term, value);
        if !value.is_finite() {
            rejected.push(RejectedEntry::new(source, RejectReason::NonFinite));
            continue;
        }

        if let Some((_, offset)) = ANNUAL_TERMS.iter().find(|(name, _)| *name == term.trim()) {
            sources.annual_estimates.insert(today.year() + offset, value);
            continue;
        }

        let quarter = match term.trim() {
            "0q" => current_quarter,
            "+1q" => current_quarter.map(|q| q.next()),
            _ => {
                rejected.push(RejectedEntry::new(source, RejectReason::UnparseableTag));
                continue;
            }
        };
        if let Some(key) = quarter {
            sources.quarterly_estimates.insert(key, value);
        }
    }

    (sources, rejected)
}
