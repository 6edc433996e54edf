// src/config.rs
use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use crate::handlers::error::AnalysisError;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TZ: &str = "Asia/Seoul";
const DEFAULT_CACHE_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub timezone: Tz,
    pub cache_ttl: Duration,
}

impl Config {
    /// Read configuration from the environment. Call `dotenv().ok()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Config::from_vars(
            env::var("EPS_DATA_DIR").ok(),
            env::var("DASHBOARD_TZ").ok(),
            env::var("CACHE_TTL_SECS").ok(),
        )
    }

    pub fn from_vars(
        data_dir: Option<String>,
        timezone: Option<String>,
        cache_ttl_secs: Option<String>,
    ) -> Result<Self, AnalysisError> {
        let data_dir = PathBuf::from(data_dir.unwrap_or_else(|| {
            warn!("EPS_DATA_DIR not set, defaulting to {}", DEFAULT_DATA_DIR);
            DEFAULT_DATA_DIR.to_string()
        }));

        let tz_name = timezone.unwrap_or_else(|| DEFAULT_TZ.to_string());
        let timezone: Tz = tz_name
            .parse()
            .map_err(|e| {
                AnalysisError::config_error(format!("DASHBOARD_TZ '{}' is invalid: {}", tz_name, e))
            })?;

        let ttl_secs = match cache_ttl_secs {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                AnalysisError::config_error(format!(
                    "CACHE_TTL_SECS '{}' is not a number: {}",
                    raw, e
                ))
            })?,
            None => DEFAULT_CACHE_TTL_SECS,
        };
        if ttl_secs < 0 {
            return Err(AnalysisError::config_error("CACHE_TTL_SECS must not be negative"));
        }
        let cache_ttl = Duration::try_seconds(ttl_secs).ok_or_else(|| {
            AnalysisError::config_error(format!("CACHE_TTL_SECS {} is out of range", ttl_secs))
        })?;

        info!("Using data dir {} and timezone {}", data_dir.display(), timezone);
        Ok(Config {
            data_dir,
            timezone,
            cache_ttl,
        })
    }

    /// Today's date in the dashboard timezone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let config = Config::from_vars(None, None, None).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.timezone, chrono_tz::Asia::Seoul);
        assert_eq!(config.cache_ttl, Duration::seconds(3600));
    }

    #[test]
    fn explicit_values_are_parsed() {
        let config = Config::from_vars(
            Some("/srv/eps".into()),
            Some("America/New_York".into()),
            Some("60".into()),
        )
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::America::New_York);
        assert_eq!(config.cache_ttl, Duration::seconds(60));
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Config::from_vars(None, Some("Mars/Olympus".into()), None).unwrap_err();
        assert_eq!(err.kind, crate::handlers::error::ErrorKind::Config);
        assert!(Config::from_vars(None, None, Some("soon".into())).is_err());
        assert!(Config::from_vars(None, None, Some("-5".into())).is_err());
    }

    #[test]
    fn ttl_beyond_duration_range_is_rejected() {
        let huge = Config::from_vars(None, None, Some("1000000000000000".into())).unwrap();
        assert_eq!(huge.cache_ttl, Duration::seconds(1_000_000_000_000_000));

        let err = Config::from_vars(None, None, Some("10000000000000000".into())).unwrap_err();
        assert_eq!(err.kind, crate::handlers::error::ErrorKind::Config);
    }
}
