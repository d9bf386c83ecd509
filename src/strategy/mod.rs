//! Strategy — turns matched events into sized value-bet candidates.
//!
//! The pipeline per market: devig the consensus prices into fair
//! probabilities, compute the EV of each bookmaker quote against them,
//! keep quotes inside the EV band, and size the survivors with
//! fractional Kelly.

pub mod devig;
pub mod ev;
pub mod kelly;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::matching::MatchedPair;
use crate::quotes::QuoteStore;
use crate::types::{MarketType, QuoteSource, ValueBet};

pub use devig::devig as devig_market;
pub use ev::ev_percent;
pub use kelly::{kelly_fraction, size_stake, KellySettings};

/// Candidate filters and staking parameters, from `[staking]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategySettings {
    /// Minimum EV% for a quote to become a candidate.
    pub min_ev_percent: f64,
    /// Too-good-to-be-true ceiling. An EV this high almost always means
    /// a stale or mistyped price, not value.
    pub max_ev_percent: f64,
    /// Minimum bookmakers behind the consensus for it to be trusted.
    pub min_books: u32,
    #[serde(flatten)]
    pub kelly: KellySettings,
}

impl Default for StrategySettings {
    fn default() -> Self {
        Self {
            min_ev_percent: 1.0,
            max_ev_percent: 50.0,
            min_books: 3,
            kelly: KellySettings::default(),
        }
    }
}

pub struct ValueFinder {
    settings: StrategySettings,
}

impl ValueFinder {
    pub fn new(settings: StrategySettings) -> Self {
        Self { settings }
    }

    /// Scan every market of one matched event pair for value.
    ///
    /// Markets that fail to devig (missing selections, no overround) are
    /// skipped without failing the pair. Stakes are sized against the
    /// bankroll balance passed in, which the caller reads under its lock.
    pub fn find(&self, pair: &MatchedPair, quotes: &QuoteStore, bankroll: f64) -> Vec<ValueBet> {
        let mut picks = Vec::new();

        if pair.consensus.books < self.settings.min_books {
            debug!(
                event = %pair.consensus,
                books = pair.consensus.books,
                min = self.settings.min_books,
                "Consensus backed by too few books, skipping event"
            );
            return picks;
        }

        for &market in MarketType::ALL {
            let consensus_odds =
                quotes.market_odds(QuoteSource::Consensus, &pair.consensus.id, market);
            if consensus_odds.is_empty() {
                continue;
            }

            let fair = match devig::devig(&consensus_odds) {
                Ok(fair) => fair,
                Err(e) => {
                    debug!(event = %pair.consensus, %market, error = %e, "Market failed to devig");
                    continue;
                }
            };

            let bookmaker_odds =
                quotes.market_odds(QuoteSource::Bookmaker, &pair.bookmaker.id, market);

            for (&selection, &price) in &bookmaker_odds {
                let Some(&fair_prob) = fair.get(&selection) else {
                    continue;
                };
                let Some(ev) = ev::ev_percent(price, fair_prob) else {
                    continue;
                };
                if ev <= self.settings.min_ev_percent {
                    trace!(%market, %selection, ev, "Below EV threshold");
                    continue;
                }
                if ev >= self.settings.max_ev_percent {
                    debug!(
                        event = %pair.bookmaker,
                        %market,
                        %selection,
                        price,
                        ev,
                        "EV above sanity cap, likely stale price; skipping"
                    );
                    continue;
                }

                let Some(plan) = kelly::size_stake(price, fair_prob, bankroll, &self.settings.kelly)
                else {
                    continue;
                };

                picks.push(ValueBet {
                    sport: pair.bookmaker.sport.clone(),
                    home: pair.bookmaker.home.clone(),
                    away: pair.bookmaker.away.clone(),
                    kickoff: pair.bookmaker.kickoff,
                    bookmaker_event_id: pair.bookmaker.id.clone(),
                    consensus_event_id: pair.consensus.id.clone(),
                    market,
                    selection,
                    price,
                    fair_prob,
                    ev_percent: ev,
                    kelly_full: plan.kelly_full,
                    stake_fraction: plan.stake_fraction,
                    stake: plan.stake,
                    books: pair.consensus.books,
                    created_at: Utc::now(),
                });
            }
        }

        picks
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
