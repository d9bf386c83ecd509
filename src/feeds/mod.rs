//! External odds and results feeds.
//!
//! The scraping of bookmaker sites lives in a separate process; this
//! crate only consumes its output. The traits here are the seam: the
//! engine works against them, the shipping implementations read JSON
//! snapshots from disk (`FileFeed`) or poll a collaborator HTTP endpoint
//! (`HttpFeed`), and tests substitute mocks.

pub mod file;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Event, MatchResult, OddsQuote, ScoutError};

pub use file::FileFeed;
pub use http::HttpFeed;

/// One source's view of a sport: its upcoming events and their quotes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedSnapshot {
    pub events: Vec<Event>,
    pub quotes: Vec<OddsQuote>,
}

/// The target bookmaker whose prices we hunt for value.
#[async_trait]
pub trait BookmakerFeed: Send + Sync {
    async fn fetch_quotes(&self, sport: &str) -> Result<FeedSnapshot, ScoutError>;
}

/// The multi-book consensus used to derive fair probabilities.
#[async_trait]
pub trait ConsensusFeed: Send + Sync {
    async fn fetch_quotes(&self, sport: &str) -> Result<FeedSnapshot, ScoutError>;
}

/// Final results, keyed by the bookmaker's event id.
#[async_trait]
pub trait ResultsFeed: Send + Sync {
    /// `Ok(None)` means the result is not known yet, which is normal
    /// for matches still in play; errors mean the source itself failed.
    async fn fetch_result(&self, event_id: &str) -> Result<Option<MatchResult>, ScoutError>;
}
