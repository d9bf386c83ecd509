//! HTTP feed: polls a collaborator odds service.
//!
//! Expected endpoints, all returning JSON:
//!   GET {base}/bookmaker/{sport}   -> FeedSnapshot
//!   GET {base}/consensus/{sport}   -> FeedSnapshot
//!   GET {base}/results/{event_id}  -> MatchResult (404 when unknown)

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use super::{BookmakerFeed, ConsensusFeed, FeedSnapshot, ResultsFeed};
use crate::types::{MatchResult, ScoutError};

pub struct HttpFeed {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFeed {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_snapshot(&self, side: &str, sport: &str) -> Result<FeedSnapshot, ScoutError> {
        let url = format!("{}/{side}/{}", self.base_url, sport.to_lowercase());
        debug!(%url, "Fetching feed snapshot");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable(side, e.to_string()))?
            .error_for_status()
            .map_err(|e| unavailable(side, e.to_string()))?;

        response
            .json::<FeedSnapshot>()
            .await
            .map_err(|e| unavailable(side, format!("bad payload: {e}")))
    }
}

fn unavailable(source: &str, message: String) -> ScoutError {
    ScoutError::DataUnavailable {
        source: source.to_string(),
        message,
    }
}

#[async_trait]
impl BookmakerFeed for HttpFeed {
    async fn fetch_quotes(&self, sport: &str) -> Result<FeedSnapshot, ScoutError> {
        self.get_snapshot("bookmaker", sport).await
    }
}

#[async_trait]
impl ConsensusFeed for HttpFeed {
    async fn fetch_quotes(&self, sport: &str) -> Result<FeedSnapshot, ScoutError> {
        self.get_snapshot("consensus", sport).await
    }
}

#[async_trait]
impl ResultsFeed for HttpFeed {
    async fn fetch_result(&self, event_id: &str) -> Result<Option<MatchResult>, ScoutError> {
        let url = format!("{}/results/{event_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| unavailable("results", e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response
            .error_for_status()
            .map_err(|e| unavailable("results", e.to_string()))?;

        let result = response
            .json::<MatchResult>()
            .await
            .map_err(|e| unavailable("results", format!("bad payload: {e}")))?;
        Ok(Some(result))
    }
}
