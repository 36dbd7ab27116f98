use crate::client::{ApiError, ApiResult, default_endpoints, default_season};
use crate::table::{NormalizationTable, TableError};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_ENDPOINTS: &str = "GRIDSTATS_ENDPOINTS";
pub const ENV_SEASON: &str = "GRIDSTATS_SEASON";
pub const ENV_TIMEOUT_SECS: &str = "GRIDSTATS_TIMEOUT_SECS";
pub const ENV_CONCURRENCY: &str = "GRIDSTATS_CONCURRENCY";
pub const ENV_TABLE_JSON: &str = "GRIDSTATS_TABLE_JSON";

/// Runtime settings for a sync. Compiled defaults, then environment overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Endpoint templates in merge order.
    pub endpoints: Vec<String>,
    pub season: u16,
    pub timeout: Duration,
    /// Athletes processed at once by a batch sync.
    pub concurrency: usize,
    pub table_path: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            season: default_season(Utc::now()),
            timeout: Duration::from_secs(10),
            concurrency: 4,
            table_path: None,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(raw) = get(ENV_ENDPOINTS) {
            let endpoints: Vec<String> = raw
                .split('|')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect();
            if endpoints.is_empty() {
                return Err(ApiError::Config(format!("{ENV_ENDPOINTS} lists no endpoints")));
            }
            config.endpoints = endpoints;
        }

        if let Some(raw) = get(ENV_SEASON) {
            config.season = parse_env(ENV_SEASON, &raw)?;
        }

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config.timeout = Duration::from_secs(parse_env(ENV_TIMEOUT_SECS, &raw)?);
        }

        if let Some(raw) = get(ENV_CONCURRENCY) {
            config.concurrency = parse_env::<usize>(ENV_CONCURRENCY, &raw)?.max(1);
        }

        config.table_path = get(ENV_TABLE_JSON).map(PathBuf::from);

        Ok(config)
    }

    /// The table named by `table_path`, or the built-in football table.
    pub fn load_table(&self) -> Result<NormalizationTable, TableError> {
        match &self.table_path {
            Some(path) => NormalizationTable::load(path),
            None => Ok(NormalizationTable::football()),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> ApiResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::Config(format!("{key}={raw:?} is not a valid number")))
}
