// src/services/ticker.rs
use csv::Reader;
use log::{debug, info};
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use crate::models::{Country, ResolvedTicker};
use crate::BoxError;

/// Common names for US listings, in English (matched case-insensitively) and
/// Korean (matched exactly).
const US_ALIASES: [(&str, &str); 33] = [
    ("tesla", "TSLA"),
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("nvidia", "NVDA"),
    ("palantir", "PLTR"),
    ("google", "GOOGL"),
    ("amazon", "AMZN"),
    ("meta", "META"),
    ("broadcom", "AVGO"),
    ("tsmc", "TSM"),
    ("amd", "AMD"),
    ("intel", "INTC"),
    ("micron", "MU"),
    ("starbucks", "SBUX"),
    ("coca-cola", "KO"),
    ("nike", "NKE"),
    ("realty income", "O"),
    ("테슬라", "TSLA"),
    ("애플", "AAPL"),
    ("마이크로소프트", "MSFT"),
    ("엔비디아", "NVDA"),
    ("팔란티어", "PLTR"),
    ("구글", "GOOGL"),
    ("아마존", "AMZN"),
    ("메타", "META"),
    ("브로드컴", "AVGO"),
    ("티에스엠", "TSM"),
    ("인텔", "INTC"),
    ("마이크론", "MU"),
    ("스타벅스", "SBUX"),
    ("코카콜라", "KO"),
    ("나이키", "NKE"),
    ("리얼티인컴", "O"),
];

const KRX_SUFFIXES: [&str; 2] = [".KS", ".KQ"];

/// One row of a KRX listing export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListedCompany {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Market")]
    pub market: String,
}

pub fn load_krx_listing(path: &Path) -> Result<Vec<ListedCompany>, BoxError> {
    info!("Loading KRX listing from {}", path.display());
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let mut rdr = Reader::from_reader(text.as_bytes());
    let mut listing = Vec::new();
    for record in rdr.deserialize() {
        let company: ListedCompany = record?;
        listing.push(company);
    }
    debug!("KRX listing has {} companies", listing.len());
    Ok(listing)
}

/// Resolve free text (company name or ticker) to a ticker and market.
pub fn resolve_ticker(input: &str, listing: &[ListedCompany]) -> ResolvedTicker {
    let input = input.trim();
    let lowered = input.to_lowercase();

    if let Some((_, ticker)) = US_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return ResolvedTicker {
            ticker: ticker.to_string(),
            display_name: format!("{} ({})", input, ticker),
            country: Country::Us,
        };
    }

    let upper = input.to_uppercase();
    if KRX_SUFFIXES.iter().any(|suffix| upper.ends_with(suffix)) {
        return ResolvedTicker {
            ticker: upper,
            display_name: input.to_string(),
            country: Country::Kr,
        };
    }

    if let Some(company) = listing.iter().find(|c| c.name == input) {
        let suffix = if company.market == "KOSPI" { ".KS" } else { ".KQ" };
        return ResolvedTicker {
            ticker: format!("{}{}", company.code, suffix),
            display_name: input.to_string(),
            country: Country::Kr,
        };
    }

    ResolvedTicker {
        ticker: upper,
        display_name: input.to_string(),
        country: Country::Us,
    }
}

fn non_digits() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^0-9]").expect("digit pattern is valid"))
}

/// Numeric exchange code of a KRX ticker (`005930.KS` -> `005930`).
pub fn krx_code(ticker: &str) -> String {
    non_digits().replace_all(ticker, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> Vec<ListedCompany> {
        vec![
            ListedCompany {
                name: "Samsung Electronics".into(),
                code: "005930".into(),
                market: "KOSPI".into(),
            },
            ListedCompany {
                name: "EcoPro".into(),
                code: "086520".into(),
                market: "KOSDAQ".into(),
            },
        ]
    }

    #[test]
    fn alias_wins_first() {
        let resolved = resolve_ticker(" Apple ", &listing());
        assert_eq!(resolved.ticker, "AAPL");
        assert_eq!(resolved.country, Country::Us);
        assert_eq!(resolved.display_name, "Apple (AAPL)");
    }

    #[test]
    fn korean_alias_matches_exactly() {
        let resolved = resolve_ticker("코카콜라", &listing());
        assert_eq!(resolved.ticker, "KO");
        assert_eq!(resolved.country, Country::Us);
        assert_eq!(resolved.display_name, "코카콜라 (KO)");
        assert_eq!(resolve_ticker(" 엔비디아 ", &[]).ticker, "NVDA");
    }

    #[test]
    fn listing_match_picks_market_suffix() {
        assert_eq!(resolve_ticker("Samsung Electronics", &listing()).ticker, "005930.KS");
        let ecopro = resolve_ticker("EcoPro", &listing());
        assert_eq!(ecopro.ticker, "086520.KQ");
        assert_eq!(ecopro.country, Country::Kr);
    }

    #[test]
    fn krx_suffix_is_korean() {
        let resolved = resolve_ticker("005930.ks", &[]);
        assert_eq!(resolved.ticker, "005930.KS");
        assert_eq!(resolved.country, Country::Kr);
    }

    #[test]
    fn fallback_is_upper_cased_us_ticker() {
        let resolved = resolve_ticker("crm", &listing());
        assert_eq!(resolved.ticker, "CRM");
        assert_eq!(resolved.country, Country::Us);
    }

    #[test]
    fn krx_code_strips_suffix() {
        assert_eq!(krx_code("005930.KS"), "005930");
    }
}
