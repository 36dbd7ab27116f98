use crate::client::{ApiResult, StatsApi};
use crate::config::SyncConfig;
use crate::normalize::{Normalized, normalize_payloads};
use crate::table::NormalizationTable;
use crate::{CanonicalPlayerRecord, ExtractedStatMap};
use futures_util::StreamExt;
use futures_util::stream;

/// What one athlete sync produced, for reporting and persistence.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub athlete_id: String,
    pub season: u16,
    pub endpoints_total: usize,
    /// `(endpoint index, expanded url)` for each endpoint that returned data.
    pub endpoints_succeeded: Vec<(usize, String)>,
    pub extracted: ExtractedStatMap,
    pub record: CanonicalPlayerRecord,
}

impl SyncReport {
    pub fn raw_key_count(&self) -> usize {
        self.extracted.len()
    }
}

/// Fetch every configured endpoint for one athlete and normalize the result.
/// Fails only when no endpoint returned data.
pub async fn sync_athlete(
    api: &StatsApi,
    config: &SyncConfig,
    table: &NormalizationTable,
    athlete_id: &str,
) -> ApiResult<SyncReport> {
    let payloads = api
        .fetch_payloads(athlete_id, config.season, &config.endpoints)
        .await?;

    let endpoints_succeeded = payloads
        .iter()
        .map(|p| (p.endpoint_index, p.url.clone()))
        .collect();
    let Normalized { extracted, record } =
        normalize_payloads(athlete_id, &payloads, table, config.season);

    Ok(SyncReport {
        athlete_id: athlete_id.to_owned(),
        season: config.season,
        endpoints_total: config.endpoints.len(),
        endpoints_succeeded,
        extracted,
        record,
    })
}

/// Sync many athletes with at most `config.concurrency` in flight. Results
/// come back in input order and one athlete's failure does not stop the rest.
pub async fn sync_athletes(
    api: &StatsApi,
    config: &SyncConfig,
    table: &NormalizationTable,
    athlete_ids: &[String],
) -> Vec<(String, ApiResult<SyncReport>)> {
    stream::iter(athlete_ids)
        .map(|id| async move { (id.clone(), sync_athlete(api, config, table, id).await) })
        .buffered(config.concurrency.max(1))
        .collect()
        .await
}
