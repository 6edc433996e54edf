// src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One fiscal quarter, e.g. `2025Q3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuarterKey {
    year: i32,
    quarter: u8,
}

impl QuarterKey {
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        if (1..=4).contains(&quarter) {
            Some(QuarterKey { year, quarter })
        } else {
            None
        }
    }

    /// Quarter containing the given calendar month (1-12).
    pub fn from_month(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            QuarterKey::new(year, ((month - 1) / 3 + 1) as u8)
        } else {
            None
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    pub fn next(&self) -> Self {
        if self.quarter == 4 {
            QuarterKey { year: self.year + 1, quarter: 1 }
        } else {
            QuarterKey { year: self.year, quarter: self.quarter + 1 }
        }
    }
}

impl fmt::Display for QuarterKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}Q{}", self.year, self.quarter)
    }
}

impl FromStr for QuarterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, quarter) = s
            .trim()
            .split_once(|c: char| c == 'Q' || c == 'q')
            .ok_or_else(|| format!("'{}' is not a quarter key", s))?;
        let year = year.parse::<i32>().map_err(|e| format!("bad year in '{}': {}", s, e))?;
        let quarter = quarter.parse::<u8>().map_err(|e| format!("bad quarter in '{}': {}", s, e))?;
        QuarterKey::new(year, quarter).ok_or_else(|| format!("quarter out of range in '{}'", s))
    }
}

impl Serialize for QuarterKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QuarterKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Quarterly EPS keyed by quarter. Gaps are normal.
pub type QuarterEpsMap = BTreeMap<QuarterKey, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    UnparseableTag,
    UnparseableValue,
    MissingValue,
    OutOfRange,
    NonFinite,
    BlendedAggregate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedEntry {
    pub source: String,
    pub reason: RejectReason,
}

impl RejectedEntry {
    pub fn new(source: impl Into<String>, reason: RejectReason) -> Self {
        RejectedEntry {
            source: source.into(),
            reason,
        }
    }
}

/// Result of a priority merge: the map plus everything that was skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapBuild {
    pub map: QuarterEpsMap,
    pub rejected: Vec<RejectedEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForwardPoint {
    pub month_end: NaiveDate,
    /// 0.0 when fewer than the minimum number of forward months resolved.
    pub value: f64,
    pub months_covered: u8,
}

impl ForwardPoint {
    pub fn has_coverage(&self) -> bool {
        self.months_covered >= crate::services::forward_eps::MIN_COVERED_MONTHS
    }
}

/// Rolling 12M forward EPS, oldest month-end first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardTrendSeries {
    pub points: Vec<ForwardPoint>,
}

impl ForwardTrendSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&ForwardPoint> {
        self.points.last()
    }

    /// `(fwd, prev, pprev)` from the newest end. With only two points
    /// `pprev` repeats `prev`.
    pub fn last_three_values(&self) -> Option<(f64, f64, f64)> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        let fwd = self.points[n - 1].value;
        let prev = self.points[n - 2].value;
        let pprev = if n >= 3 { self.points[n - 3].value } else { prev };
        Some((fwd, prev, pprev))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroReading {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "US")]
    Us,
    #[serde(rename = "KR")]
    Kr,
}

impl Country {
    pub fn code(&self) -> &'static str {
        match self {
            Country::Us => "US",
            Country::Kr => "KR",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    RecoveryAccelerating,
    RecoveryDecelerating,
    ContractionEasing,
    ContractionDeepening,
    ExpansionAccelerating,
    ExpansionDecelerating,
    SlowdownAccelerating,
    MildCorrection,
}

impl TrendLabel {
    pub fn describe(&self) -> &'static str {
        match self {
            TrendLabel::RecoveryAccelerating => "recovery accelerating",
            TrendLabel::RecoveryDecelerating => "recovery decelerating",
            TrendLabel::ContractionEasing => "contraction easing",
            TrendLabel::ContractionDeepening => "contraction deepening",
            TrendLabel::ExpansionAccelerating => "expansion accelerating",
            TrendLabel::ExpansionDecelerating => "expansion decelerating",
            TrendLabel::SlowdownAccelerating => "slowdown accelerating",
            TrendLabel::MildCorrection => "mild correction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    StrongPositive,
    MildPositive,
    MildCaution,
    StrongNegative,
    Overheating,
    Negative,
    Neutral,
}

impl Severity {
    pub fn color(&self) -> &'static str {
        match self {
            Severity::StrongPositive => "green",
            Severity::MildPositive => "blue",
            Severity::MildCaution => "orange",
            Severity::StrongNegative => "red",
            Severity::Overheating => "red",
            Severity::Negative => "blue",
            Severity::Neutral => "gray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliTrend {
    pub label: TrendLabel,
    pub severity: Severity,
}

impl fmt::Display for CliTrend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} [{}]", self.label.describe(), self.severity.color())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondRisk {
    Stable,
    RecessionWarning,
    FinancialCrisis,
}

impl BondRisk {
    pub fn describe(&self) -> &'static str {
        match self {
            BondRisk::Stable => "stable",
            BondRisk::RecessionWarning => "[caution] recession signal",
            BondRisk::FinancialCrisis => "[severe] financial crisis (strong sell)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSignal {
    AggressiveBuy,
    Cautious,
    SellOrHold,
}

impl TradeSignal {
    pub fn describe(&self) -> &'static str {
        match self {
            TradeSignal::AggressiveBuy => "aggressive buy (accelerating growth)",
            TradeSignal::Cautious => "cautious (momentum slowing)",
            TradeSignal::SellOrHold => "sell/hold (negative growth)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Momentum {
    pub forward_eps: f64,
    /// Percent change against the previous month. `None` when the base is zero.
    pub growth_now: Option<f64>,
    pub growth_prev: Option<f64>,
    /// Percentage points; unknown growth counts as zero here.
    pub acceleration: f64,
    pub signal: TradeSignal,
}

/// Short label/value pairs describing the raw EPS figures behind a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsFigure {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpsSnapshot {
    pub build: MapBuild,
    pub overview: Vec<EpsFigure>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroData {
    #[serde(default)]
    pub yield_spread: Vec<MacroReading>,
    #[serde(default)]
    pub high_yield_spread: Vec<MacroReading>,
    #[serde(default)]
    pub cli: BTreeMap<Country, Vec<MacroReading>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacroView {
    pub yield_spread: Option<f64>,
    pub high_yield_spread: Option<f64>,
    pub bond_risk: BondRisk,
    pub cli: BTreeMap<Country, Option<CliReading>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CliReading {
    pub latest: f64,
    pub trend: CliTrend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTicker {
    pub ticker: String,
    pub display_name: String,
    pub country: Country,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub ticker: ResolvedTicker,
    pub today: NaiveDate,
    pub trend: ForwardTrendSeries,
    pub momentum: Momentum,
    pub bond_risk: BondRisk,
    pub cli_trend: Option<CliTrend>,
    pub overview: Vec<EpsFigure>,
    pub rejected: Vec<RejectedEntry>,
    pub prompt: String,
    pub opinion: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_key_text_form() {
        let key = QuarterKey::new(2025, 3).unwrap();
        assert_eq!(key.to_string(), "2025Q3");
        assert_eq!("2025Q3".parse::<QuarterKey>().unwrap(), key);
        assert!("2025Q5".parse::<QuarterKey>().is_err());
        assert!("2025".parse::<QuarterKey>().is_err());
    }

    #[test]
    fn quarter_key_rejects_out_of_range() {
        assert!(QuarterKey::new(2025, 0).is_none());
        assert!(QuarterKey::new(2025, 5).is_none());
        assert!(QuarterKey::from_month(2025, 13).is_none());
        assert_eq!(QuarterKey::from_month(2025, 12), QuarterKey::new(2025, 4));
        assert_eq!(QuarterKey::from_month(2025, 1), QuarterKey::new(2025, 1));
    }

    #[test]
    fn next_quarter_rolls_year() {
        let q4 = QuarterKey::new(2025, 4).unwrap();
        assert_eq!(q4.next(), QuarterKey::new(2026, 1).unwrap());
    }

    #[test]
    fn map_serializes_with_text_keys() {
        let mut map = QuarterEpsMap::new();
        map.insert(QuarterKey::new(2024, 1).unwrap(), 1.5);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2024Q1":1.5}"#);
        let back: QuarterEpsMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn last_three_values_repeats_prev_for_short_series() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let point = |value| ForwardPoint { month_end: d, value, months_covered: 12 };
        let series = ForwardTrendSeries { points: vec![point(1.0), point(2.0)] };
        assert_eq!(series.last_three_values(), Some((2.0, 1.0, 1.0)));
        let single = ForwardTrendSeries { points: vec![point(1.0)] };
        assert_eq!(single.last_three_values(), None);
    }
}
