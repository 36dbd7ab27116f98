use chrono::{DateTime, Datelike, Utc};
use futures_util::future::join_all;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const ESPN_COMMON_V3: &str = "https://site.web.api.espn.com/apis/common/v3/sports/football/nfl";
const ESPN_SITE_V2: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";
const ESPN_CORE_V2: &str = "https://sports.core.api.espn.com/v2/sports/football/leagues/nfl";

/// Endpoint templates tried for every athlete, in merge order. Later entries
/// win when two endpoints report the same raw stat name.
pub fn default_endpoints() -> Vec<String> {
    vec![
        format!("{ESPN_COMMON_V3}/athletes/{{athlete_id}}/stats?season={{season}}"),
        format!("{ESPN_SITE_V2}/athletes/{{athlete_id}}/statistics?season={{season}}"),
        format!("{ESPN_CORE_V2}/seasons/{{season}}/types/2/athletes/{{athlete_id}}/statistics"),
    ]
}

/// Athlete stat client backed by ESPN's public endpoints.
#[derive(Debug, Clone)]
pub struct StatsApi {
    client: Client,
    timeout: Duration,
}

impl Default for StatsApi {
    fn default() -> Self {
        Self {
            client: Client::builder()
                .user_agent("gridstats/0.1 (athlete stat normalizer)")
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NoDataAvailable(String),
    Config(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NoDataAvailable(athlete) => {
                write!(f, "No data available: every endpoint failed for athlete {athlete}")
            }
            ApiError::Config(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// A payload that came back successfully, tagged with its place in the
/// endpoint list.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPayload {
    pub endpoint_index: usize,
    pub url: String,
    pub body: Value,
}

impl StatsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the per-request transport timeout. A request that exceeds it
    /// is an ordinary endpoint failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request every endpoint for one athlete concurrently.
    ///
    /// Failed endpoints are logged and dropped. Survivors are returned in
    /// endpoint-list order regardless of completion order. Only an empty
    /// result is an error.
    pub async fn fetch_payloads(
        &self,
        athlete_id: &str,
        season: u16,
        endpoints: &[String],
    ) -> ApiResult<Vec<FetchedPayload>> {
        let requests = endpoints.iter().enumerate().map(|(endpoint_index, template)| {
            let url = expand_template(template, athlete_id, season);
            async move {
                let result = self.get_json(&url).await;
                (endpoint_index, url, result)
            }
        });

        let mut payloads = Vec::new();
        for (endpoint_index, url, result) in join_all(requests).await {
            match result {
                Ok(body) => {
                    debug!("endpoint {endpoint_index} ok: {url}");
                    payloads.push(FetchedPayload { endpoint_index, url, body });
                }
                Err(e) => warn!("endpoint {endpoint_index} unreachable, skipping: {e}"),
            }
        }

        if payloads.is_empty() {
            return Err(ApiError::NoDataAvailable(athlete_id.to_owned()));
        }
        info!(
            "athlete {athlete_id}: {}/{} endpoints returned data",
            payloads.len(),
            endpoints.len()
        );
        Ok(payloads)
    }

    async fn get_json(&self, url: &str) -> ApiResult<Value> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;

        response
            .error_for_status()
            .map_err(|e| ApiError::Api(e, url.to_owned()))?
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned()))
    }
}

/// Fill `{athlete_id}` and `{season}` placeholders.
pub fn expand_template(template: &str, athlete_id: &str, season: u16) -> String {
    template
        .replace("{athlete_id}", athlete_id)
        .replace("{season}", &season.to_string())
}

/// NFL seasons start in September and finish in February, so January through
/// July still belong to the previous calendar year's season.
pub fn default_season(now: DateTime<Utc>) -> u16 {
    let year = if now.month() >= 8 { now.year() } else { now.year() - 1 };
    u16::try_from(year).unwrap_or(u16::MAX)
}
