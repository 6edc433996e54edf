// src/services/quarter_map.rs
//
// Priority merge of EPS observations into one value per quarter.
// Nothing here logs; every skipped input comes back in `MapBuild::rejected`.
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::models::{MapBuild, QuarterEpsMap, QuarterKey, RejectReason, RejectedEntry};

const MISSING_MARKERS: [&str; 4] = ["-", "", "nan", "N/A"];
const BLENDED_MARKER: &str = "Blended";

/// A raw `(tag, value)` cell from a consolidated consensus table, e.g.
/// `("A|2024/12", "4,950")` or `("Q|2025/03", "1,210(P)")`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub tag: String,
    pub value: String,
}

impl RawCell {
    pub fn new(tag: impl Into<String>, value: impl Into<String>) -> Self {
        RawCell {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnualFigure {
    pub year: i32,
    pub value: f64,
    /// Trailing / blended aggregates are never spread into quarters.
    pub blended: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuarterlyFigure {
    pub year: i32,
    pub month: u32,
    pub value: f64,
}

/// Annual and quarterly figures from one consolidated source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConsolidatedFigures {
    pub annual: Vec<AnnualFigure>,
    pub quarterly: Vec<QuarterlyFigure>,
}

/// Realized actuals, annual estimates and quarterly estimates kept apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeparateSources {
    pub actuals: BTreeMap<QuarterKey, f64>,
    pub annual_estimates: BTreeMap<i32, f64>,
    pub quarterly_estimates: BTreeMap<QuarterKey, f64>,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([AQ])\|\s*(\d{4})(?:/(\d{1,2}))?").expect("tag pattern is valid")
    })
}

/// Cleans a raw cell value: drops thousands separators and any trailing
/// `(...)` annotation. `Ok(None)` means the cell is an explicit "no value".
pub fn clean_value(raw: &str) -> Result<Option<f64>, RejectReason> {
    let without_commas = raw.replace(',', "");
    let head = without_commas.split('(').next().unwrap_or("").trim();
    if MISSING_MARKERS.contains(&head) {
        return Ok(None);
    }
    let value = head.parse::<f64>().map_err(|_| RejectReason::UnparseableValue)?;
    if !value.is_finite() {
        return Err(RejectReason::NonFinite);
    }
    Ok(Some(value))
}

/// Splits raw consolidated cells into typed figures.
pub fn parse_consolidated(cells: &[RawCell]) -> (ConsolidatedFigures, Vec<RejectedEntry>) {
    let mut figures = ConsolidatedFigures::default();
    let mut rejected = Vec::new();

    for cell in cells {
        let source = format!("{}={}", cell.tag, cell.value);
        let Some(caps) = tag_pattern().captures(&cell.tag) else {
            rejected.push(RejectedEntry::new(source, RejectReason::UnparseableTag));
            continue;
        };

        let value = match clean_value(&cell.value) {
            Ok(Some(v)) => v,
            Ok(None) => {
                rejected.push(RejectedEntry::new(source, RejectReason::MissingValue));
                continue;
            }
            Err(reason) => {
                rejected.push(RejectedEntry::new(source, reason));
                continue;
            }
        };

        let year: i32 = match caps[2].parse() {
            Ok(y) => y,
            Err(_) => {
                rejected.push(RejectedEntry::new(source, RejectReason::UnparseableTag));
                continue;
            }
        };

        if &caps[1] == "A" {
            figures.annual.push(AnnualFigure {
                year,
                value,
                blended: cell.tag.contains(BLENDED_MARKER),
            });
        } else {
            let month = caps.get(3).and_then(|m| m.as_str().parse::<u32>().ok());
            match month {
                Some(month) => figures.quarterly.push(QuarterlyFigure { year, month, value }),
                None => rejected.push(RejectedEntry::new(source, RejectReason::UnparseableTag)),
            }
        }
    }

    (figures, rejected)
}

/// Consolidated merge: annual/4 into every quarter, then quarterly overwrites.
pub fn merge_consolidated(figures: &ConsolidatedFigures) -> MapBuild {
    let mut map = QuarterEpsMap::new();
    let mut rejected = Vec::new();

    for annual in &figures.annual {
        let source = format!("annual {}={}", annual.year, annual.value);
        if annual.blended {
            rejected.push(RejectedEntry::new(source, RejectReason::BlendedAggregate));
            continue;
        }
        if !annual.value.is_finite() {
            rejected.push(RejectedEntry::new(source, RejectReason::NonFinite));
            continue;
        }
        spread_annual(&mut map, annual.year, annual.value);
    }

    for quarterly in &figures.quarterly {
        let source = format!(
            "quarterly {}/{:02}={}",
            quarterly.year, quarterly.month, quarterly.value
        );
        if !quarterly.value.is_finite() {
            rejected.push(RejectedEntry::new(source, RejectReason::NonFinite));
            continue;
        }
        match QuarterKey::from_month(quarterly.year, quarterly.month) {
            Some(key) => {
                map.insert(key, quarterly.value);
            }
            None => rejected.push(RejectedEntry::new(source, RejectReason::OutOfRange)),
        }
    }

    MapBuild { map, rejected }
}

/// Parse and merge raw consolidated cells in one step.
pub fn build_from_consolidated(cells: &[RawCell]) -> MapBuild {
    let (figures, mut rejected) = parse_consolidated(cells);
    let mut build = merge_consolidated(&figures);
    rejected.append(&mut build.rejected);
    build.rejected = rejected;
    build
}

/// Separate-source merge, lowest to highest priority:
/// annual estimate/4, quarterly estimate, realized actual.
pub fn merge_separate(sources: &SeparateSources) -> MapBuild {
    let mut map = QuarterEpsMap::new();
    let mut rejected = Vec::new();

    for (&year, &value) in &sources.annual_estimates {
        if value.is_finite() {
            spread_annual(&mut map, year, value);
        } else {
            rejected.push(RejectedEntry::new(
                format!("annual estimate {}={}", year, value),
                RejectReason::NonFinite,
            ));
        }
    }

    let layers = [
        ("quarterly estimate", &sources.quarterly_estimates),
        ("actual", &sources.actuals),
    ];
    for (name, layer) in layers {
        for (&key, &value) in layer {
            if value.is_finite() {
                map.insert(key, value);
            } else {
                rejected.push(RejectedEntry::new(
                    format!("{} {}={}", name, key, value),
                    RejectReason::NonFinite,
                ));
            }
        }
    }

    MapBuild { map, rejected }
}

fn spread_annual(map: &mut QuarterEpsMap, year: i32, value: f64) {
    for quarter in 1..=4 {
        if let Some(key) = QuarterKey::new(year, quarter) {
            map.insert(key, value / 4.0);
        }
    }
}
