// src/services/sources.rs
//
// Acquisition collaborators. The core never calls these; handlers do.
use chrono::{Datelike, Duration, NaiveDate};
use log::{info, warn};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

use crate::models::{Country, EpsFigure, EpsSnapshot, MacroData, ResolvedTicker};
use crate::services::cache::{Clock, SystemClock, TtlCache};
use crate::services::consensus_csv::load_consensus_csv;
use crate::services::estimates::{resolve_sheet, EstimateSheet};
use crate::services::quarter_map::{build_from_consolidated, clean_value, merge_separate};
use crate::services::ticker::krx_code;
use crate::BoxError;

const RECENT_ACTUALS: usize = 4;

pub trait MacroSource {
    fn fetch_macro(&self) -> Result<MacroData, BoxError>;
}

pub trait EpsSource {
    fn fetch_eps(&self, ticker: &ResolvedTicker, today: NaiveDate) -> Result<EpsSnapshot, BoxError>;
}

/// Reads `macro.json` and `eps/*` from a data directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    data_dir: PathBuf,
}

impl FileSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        FileSource {
            data_dir: data_dir.into(),
        }
    }

    fn read(&self, relative: &str) -> Result<String, BoxError> {
        let path = self.data_dir.join(relative);
        info!("Reading {}", path.display());
        fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into())
    }

    fn consolidated_snapshot(&self, ticker: &ResolvedTicker) -> Result<EpsSnapshot, BoxError> {
        let code = krx_code(&ticker.ticker);
        if code.is_empty() {
            return Err(format!("No numeric code in ticker {}", ticker.ticker).into());
        }
        let cells = load_consensus_csv(&self.data_dir.join("eps").join(format!("{}.csv", code)))?;

        let overview = cells
            .iter()
            .filter_map(|cell| match clean_value(&cell.value) {
                Ok(Some(value)) => Some(EpsFigure { label: cell.tag.clone(), value }),
                _ => None,
            })
            .collect();
        let build = build_from_consolidated(&cells);
        info!(
            "{}: {} quarters from {} consensus cells",
            ticker.ticker,
            build.map.len(),
            cells.len()
        );

        Ok(EpsSnapshot { build, overview })
    }

    fn separate_snapshot(
        &self,
        ticker: &ResolvedTicker,
        today: NaiveDate,
    ) -> Result<EpsSnapshot, BoxError> {
        let text = self.read(&format!("eps/{}.json", ticker.ticker))?;
        let sheet: EstimateSheet = serde_json::from_str(&text)?;

        let (sources, mut rejected) = resolve_sheet(&sheet, today);
        let mut build = merge_separate(&sources);
        rejected.append(&mut build.rejected);
        build.rejected = rejected;

        let mut overview = Vec::new();
        if let Some(&value) = sources.annual_estimates.get(&today.year()) {
            overview.push(EpsFigure {
                label: format!("annual estimate {}", today.year()),
                value,
            });
        }
        let skip = sources.actuals.len().saturating_sub(RECENT_ACTUALS);
        for (key, &value) in sources.actuals.iter().skip(skip) {
            overview.push(EpsFigure {
                label: format!("actual {}", key),
                value,
            });
        }

        Ok(EpsSnapshot { build, overview })
    }
}

impl MacroSource for FileSource {
    fn fetch_macro(&self) -> Result<MacroData, BoxError> {
        let text = self.read("macro.json")?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl EpsSource for FileSource {
    fn fetch_eps(
        &self,
        ticker: &ResolvedTicker,
        today: NaiveDate,
    ) -> Result<EpsSnapshot, BoxError> {
        match ticker.country {
            Country::Kr => self.consolidated_snapshot(ticker),
            Country::Us => self.separate_snapshot(ticker, today),
        }
    }
}

/// Any [`MacroSource`] behind a single-entry TTL cache.
pub struct CachedMacroSource<S, C: Clock = SystemClock> {
    inner: S,
    cache: RefCell<TtlCache<&'static str, MacroData, C>>,
}

impl<S: MacroSource> CachedMacroSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedMacroSource::with_cache(inner, TtlCache::new(ttl))
    }
}

impl<S: MacroSource, C: Clock> CachedMacroSource<S, C> {
    pub fn with_cache(inner: S, cache: TtlCache<&'static str, MacroData, C>) -> Self {
        CachedMacroSource {
            inner,
            cache: RefCell::new(cache),
        }
    }
}

impl<S: MacroSource, C: Clock> MacroSource for CachedMacroSource<S, C> {
    fn fetch_macro(&self) -> Result<MacroData, BoxError> {
        self.cache
            .borrow_mut()
            .get_or_try_insert_with("macro", || self.inner.fetch_macro())
            .map_err(|e| {
                warn!("Macro fetch failed: {}", e);
                e
            })
    }
}

/// Any [`EpsSource`] behind a TTL cache keyed by ticker and reference date.
pub struct CachedEpsSource<S, C: Clock = SystemClock> {
    inner: S,
    cache: RefCell<TtlCache<(String, NaiveDate), EpsSnapshot, C>>,
}

impl<S: EpsSource> CachedEpsSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        CachedEpsSource::with_cache(inner, TtlCache::new(ttl))
    }
}

impl<S: EpsSource, C: Clock> CachedEpsSource<S, C> {
    pub fn with_cache(inner: S, cache: TtlCache<(String, NaiveDate), EpsSnapshot, C>) -> Self {
        CachedEpsSource {
            inner,
            cache: RefCell::new(cache),
        }
    }
}

impl<S: EpsSource, C: Clock> EpsSource for CachedEpsSource<S, C> {
    fn fetch_eps(
        &self,
        ticker: &ResolvedTicker,
        today: NaiveDate,
    ) -> Result<EpsSnapshot, BoxError> {
        let key = (ticker.ticker.clone(), today);
        self.cache
            .borrow_mut()
            .get_or_try_insert_with(key, || self.inner.fetch_eps(ticker, today))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::cache::tests::ManualClock;
    use std::cell::Cell;

    struct CountingMacro {
        calls: Cell<u32>,
    }

    impl MacroSource for CountingMacro {
        fn fetch_macro(&self) -> Result<MacroData, BoxError> {
            self.calls.set(self.calls.get() + 1);
            Ok(MacroData {
                yield_spread: Vec::new(),
                high_yield_spread: Vec::new(),
                cli: Default::default(),
            })
        }
    }

    #[test]
    fn cached_macro_refetches_after_ttl() {
        let clock = ManualClock::starting_now();
        let source = CachedMacroSource::with_cache(
            CountingMacro { calls: Cell::new(0) },
            TtlCache::with_clock(Duration::seconds(3600), clock.clone()),
        );
        source.fetch_macro().unwrap();
        source.fetch_macro().unwrap();
        assert_eq!(source.inner.calls.get(), 1);

        clock.advance(Duration::seconds(3601));
        source.fetch_macro().unwrap();
        assert_eq!(source.inner.calls.get(), 2);
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = FileSource::new("/nonexistent/eps-dashboard");
        assert!(source.fetch_macro().is_err());
    }
}
