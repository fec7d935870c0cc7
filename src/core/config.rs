use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub collection: String,

    // Pagination
    pub default_page_limit: usize,
    pub page_limits: Vec<usize>,

    // Ranking
    pub eligible_age_years: f64,                // Rounded 365-day years
    pub query_timeout_ms: u64,                  // Per store round-trip

    // Fixed-size listings
    pub top_overall: usize,
    pub top_by_gender: usize,
    pub top_by_nationality: usize,
    pub top_by_validation_date: usize,
    pub recent_validation_days: i64,
    pub recent_death_days: i64,
    pub centenarian_max_age_years: f64,         // Unrounded 365-day years

    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            collection: "humans".to_string(),
            default_page_limit: 100,
            page_limits: vec![25, 50, 100],
            eligible_age_years: 110.0,
            query_timeout_ms: 10_000,
            top_overall: 10,
            top_by_gender: 30,
            top_by_nationality: 30,
            top_by_validation_date: 30,
            recent_validation_days: 30,
            recent_death_days: 60,
            centenarian_max_age_years: 109.0,
            log_filter: "longevix=info".to_string(),
        }
    }
}

impl Config {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    /// Partial JSON overrides the defaults field by field.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults overridden by `LONGEVIX_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Config::default();
        for (key, value) in vars {
            let value = value.as_ref();
            match key.as_ref() {
                "LONGEVIX_COLLECTION" => config.collection = value.to_string(),
                "LONGEVIX_QUERY_TIMEOUT_MS" => config.query_timeout_ms = parse_var(key.as_ref(), value)?,
                "LONGEVIX_ELIGIBLE_AGE" => config.eligible_age_years = parse_var(key.as_ref(), value)?,
                "LONGEVIX_DEFAULT_PAGE_LIMIT" => config.default_page_limit = parse_var(key.as_ref(), value)?,
                "LONGEVIX_LOG" => config.log_filter = value.to_string(),
                _ => {}
            }
        }
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse::<T>().map_err(|_| {
        Error::new(
            ErrorKind::InvalidInput,
            format!("{} has invalid value '{}'", key, value),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json_str(r#"{"collection": "supercentenarians"}"#).unwrap();
        assert_eq!(config.collection, "supercentenarians");
        assert_eq!(config.default_page_limit, 100);
        assert_eq!(config.page_limits, vec![25, 50, 100]);
    }

    #[test]
    fn env_overrides() {
        let config = Config::from_vars([
            ("LONGEVIX_QUERY_TIMEOUT_MS", "250"),
            ("LONGEVIX_LOG", "longevix=debug"),
            ("UNRELATED", "x"),
        ])
        .unwrap();
        assert_eq!(config.query_timeout(), Duration::from_millis(250));
        assert_eq!(config.log_filter, "longevix=debug");
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let err = Config::from_vars([("LONGEVIX_ELIGIBLE_AGE", "old")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }
}
