//! Quote Store — the latest raw odds from both sources.
//!
//! Holds one quote per (source, event, market, selection) key. Quotes are
//! never mutated: a newer observation for the same key supersedes the old
//! one. Each scan cycle replaces a source's entries wholesale so that all
//! downstream stages operate on a single coherent snapshot.

use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::types::{MarketType, OddsQuote, QuoteSource, Selection};

type QuoteKey = (String, MarketType, Selection);

/// Transient per-cycle snapshot of quotes from both sources.
#[derive(Debug, Default)]
pub struct QuoteStore {
    bookmaker: HashMap<QuoteKey, OddsQuote>,
    consensus: HashMap<QuoteKey, OddsQuote>,
}

impl QuoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn side(&self, source: QuoteSource) -> &HashMap<QuoteKey, OddsQuote> {
        match source {
            QuoteSource::Bookmaker => &self.bookmaker,
            QuoteSource::Consensus => &self.consensus,
        }
    }

    /// Replace all quotes for one source with a fresh batch.
    ///
    /// Invalid quotes (price < 1.01) are dropped, not an error — the
    /// selection is simply absent this cycle. When the batch carries two
    /// observations for the same key, the most recent one wins.
    pub fn replace(&mut self, source: QuoteSource, quotes: Vec<OddsQuote>) {
        let map = match source {
            QuoteSource::Bookmaker => &mut self.bookmaker,
            QuoteSource::Consensus => &mut self.consensus,
        };
        map.clear();

        let mut dropped = 0usize;
        for q in quotes {
            if let Err(e) = q.validate() {
                debug!(quote = %q, error = %e, "Dropping quote");
                dropped += 1;
                continue;
            }
            let key = (q.event_id.clone(), q.market, q.selection);
            match map.get(&key) {
                Some(existing) if existing.observed_at >= q.observed_at => {}
                _ => {
                    map.insert(key, q);
                }
            }
        }

        if dropped > 0 {
            debug!(%source, dropped, "Dropped invalid quotes from batch");
        }
    }

    /// Number of quotes held for a source.
    pub fn len(&self, source: QuoteSource) -> usize {
        self.side(source).len()
    }

    pub fn is_empty(&self, source: QuoteSource) -> bool {
        self.side(source).is_empty()
    }

    /// Selection → price map for one event's market, if any quotes exist.
    ///
    /// Returned as a BTreeMap so iteration order is deterministic.
    pub fn market_odds(
        &self,
        source: QuoteSource,
        event_id: &str,
        market: MarketType,
    ) -> BTreeMap<Selection, f64> {
        self.side(source)
            .values()
            .filter(|q| q.event_id == event_id && q.market == market)
            .map(|q| (q.selection, q.price))
            .collect()
    }

    /// Latest quote for an exact key, if present.
    pub fn get(
        &self,
        source: QuoteSource,
        event_id: &str,
        market: MarketType,
        selection: Selection,
    ) -> Option<&OddsQuote> {
        self.side(source)
            .get(&(event_id.to_string(), market, selection))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn quote(
        source: QuoteSource,
        event_id: &str,
        market: MarketType,
        selection: Selection,
        price: f64,
        age_secs: i64,
    ) -> OddsQuote {
        OddsQuote {
            source,
            event_id: event_id.to_string(),
            market,
            selection,
            price,
            observed_at: Utc::now() - Duration::seconds(age_secs),
        }
    }

    #[test]
    fn test_replace_wholesale() {
        let mut store = QuoteStore::new();
        store.replace(
            QuoteSource::Bookmaker,
            vec![quote(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home, 2.1, 0)],
        );
        assert_eq!(store.len(QuoteSource::Bookmaker), 1);

        // A new cycle's batch fully replaces the old entries
        store.replace(
            QuoteSource::Bookmaker,
            vec![quote(QuoteSource::Bookmaker, "e2", MarketType::MatchResult, Selection::Away, 3.0, 0)],
        );
        assert_eq!(store.len(QuoteSource::Bookmaker), 1);
        assert!(store
            .get(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home)
            .is_none());
        assert!(store
            .get(QuoteSource::Bookmaker, "e2", MarketType::MatchResult, Selection::Away)
            .is_some());
    }

    #[test]
    fn test_invalid_price_dropped() {
        let mut store = QuoteStore::new();
        store.replace(
            QuoteSource::Consensus,
            vec![
                quote(QuoteSource::Consensus, "e1", MarketType::MatchResult, Selection::Home, 1.00, 0),
                quote(QuoteSource::Consensus, "e1", MarketType::MatchResult, Selection::Away, 2.00, 0),
            ],
        );
        assert_eq!(store.len(QuoteSource::Consensus), 1);
    }

    #[test]
    fn test_newer_quote_supersedes() {
        let mut store = QuoteStore::new();
        store.replace(
            QuoteSource::Bookmaker,
            vec![
                quote(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home, 2.10, 60),
                quote(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home, 2.25, 0),
            ],
        );
        let q = store
            .get(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home)
            .unwrap();
        assert!((q.price - 2.25).abs() < 1e-10);
    }

    #[test]
    fn test_older_quote_does_not_supersede() {
        let mut store = QuoteStore::new();
        store.replace(
            QuoteSource::Bookmaker,
            vec![
                quote(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home, 2.25, 0),
                quote(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home, 2.10, 60),
            ],
        );
        let q = store
            .get(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home)
            .unwrap();
        assert!((q.price - 2.25).abs() < 1e-10);
    }

    #[test]
    fn test_market_odds_scoped_to_event_and_market() {
        let mut store = QuoteStore::new();
        store.replace(
            QuoteSource::Consensus,
            vec![
                quote(QuoteSource::Consensus, "e1", MarketType::MatchResult, Selection::Home, 2.00, 0),
                quote(QuoteSource::Consensus, "e1", MarketType::MatchResult, Selection::Draw, 3.40, 0),
                quote(QuoteSource::Consensus, "e1", MarketType::MatchResult, Selection::Away, 4.20, 0),
                quote(QuoteSource::Consensus, "e1", MarketType::TotalGoals, Selection::Over, 1.90, 0),
                quote(QuoteSource::Consensus, "e2", MarketType::MatchResult, Selection::Home, 1.50, 0),
            ],
        );

        let odds = store.market_odds(QuoteSource::Consensus, "e1", MarketType::MatchResult);
        assert_eq!(odds.len(), 3);
        assert!((odds[&Selection::Draw] - 3.40).abs() < 1e-10);

        let ou = store.market_odds(QuoteSource::Consensus, "e1", MarketType::TotalGoals);
        assert_eq!(ou.len(), 1);

        let empty = store.market_odds(QuoteSource::Consensus, "e3", MarketType::MatchResult);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_sources_independent() {
        let mut store = QuoteStore::new();
        store.replace(
            QuoteSource::Bookmaker,
            vec![quote(QuoteSource::Bookmaker, "e1", MarketType::MatchResult, Selection::Home, 2.10, 0)],
        );
        assert!(store.is_empty(QuoteSource::Consensus));
        assert!(!store.is_empty(QuoteSource::Bookmaker));
    }
}
