//! File-based feed: reads JSON snapshots dropped on disk.
//!
//! The scraper process writes `bookmaker_<sport>.json` and
//! `consensus_<sport>.json` snapshot files plus a `results.json` map of
//! event id → final result. We read whatever is there on each cycle; a
//! missing snapshot means the source is unavailable this cycle.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{BookmakerFeed, ConsensusFeed, FeedSnapshot, ResultsFeed};
use crate::types::{MatchResult, ScoutError};

pub struct FileFeed {
    dir: PathBuf,
}

impl FileFeed {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_snapshot(&self, prefix: &str, sport: &str) -> Result<FeedSnapshot, ScoutError> {
        let name = format!("{prefix}_{}.json", sport.to_lowercase());
        let path = self.dir.join(&name);
        let snapshot = read_json(&path).map_err(|message| ScoutError::DataUnavailable {
            source: prefix.to_string(),
            message,
        })?;
        debug!(file = %path.display(), "Loaded feed snapshot");
        Ok(snapshot)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    serde_json::from_str(&contents).map_err(|e| format!("cannot parse {}: {e}", path.display()))
}

#[async_trait]
impl BookmakerFeed for FileFeed {
    async fn fetch_quotes(&self, sport: &str) -> Result<FeedSnapshot, ScoutError> {
        self.read_snapshot("bookmaker", sport)
    }
}

#[async_trait]
impl ConsensusFeed for FileFeed {
    async fn fetch_quotes(&self, sport: &str) -> Result<FeedSnapshot, ScoutError> {
        self.read_snapshot("consensus", sport)
    }
}

#[async_trait]
impl ResultsFeed for FileFeed {
    async fn fetch_result(&self, event_id: &str) -> Result<Option<MatchResult>, ScoutError> {
        let path = self.dir.join("results.json");
        if !path.exists() {
            // No results published yet
            return Ok(None);
        }
        let results: HashMap<String, MatchResult> =
            read_json(&path).map_err(|message| ScoutError::DataUnavailable {
                source: "results".to_string(),
                message,
            })?;
        Ok(results.get(event_id).copied())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
