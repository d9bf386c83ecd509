//! Bet Ledger — the append-style record of every flagged bet.
//!
//! The ledger owns all `Bet` entries. Creation goes through
//! `record_if_new`, which enforces the daily dedup rule; status changes
//! go through the settlement engine. Nothing else mutates a bet.

pub mod bankroll;
pub mod settlement;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{Bet, BetStatus, ValueBet};

/// Read-side filter for ledger queries (dashboard and CSV export).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerFilter {
    pub sport: Option<String>,
    pub status: Option<BetStatus>,
    pub min_ev: Option<f64>,
    pub min_odds: Option<f64>,
    pub max_odds: Option<f64>,
}

impl LedgerFilter {
    pub fn matches(&self, bet: &Bet) -> bool {
        if let Some(sport) = &self.sport {
            if !bet.pick.sport.eq_ignore_ascii_case(sport) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if bet.status != status {
                return false;
            }
        }
        if let Some(min_ev) = self.min_ev {
            if bet.pick.ev_percent < min_ev {
                return false;
            }
        }
        if let Some(min) = self.min_odds {
            if bet.pick.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_odds {
            if bet.pick.price > max {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetLedger {
    bets: Vec<Bet>,
}

impl BetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic dedup key: the same offer re-observed within one UTC
    /// day maps to the same key. A price move of a cent or a new day makes
    /// it a distinct opportunity again.
    pub fn dedup_key(pick: &ValueBet) -> String {
        format!(
            "{}|{}|{}|{:.2}|{}",
            pick.bookmaker_event_id,
            pick.market,
            pick.selection,
            pick.price,
            pick.created_at.format("%Y-%m-%d"),
        )
    }

    /// Record a flagged opportunity unless its dedup key already exists.
    ///
    /// Re-flagging is normal (every scan re-sees the same offers), so a
    /// duplicate is a silent no-op, not an error. Returns the new entry
    /// when one was created.
    pub fn record_if_new(&mut self, pick: &ValueBet) -> Option<Bet> {
        let key = Self::dedup_key(pick);
        if self.bets.iter().any(|b| b.key == key) {
            debug!(%key, "Opportunity already in ledger, skipping");
            return None;
        }

        let bet = Bet {
            id: Uuid::new_v4().to_string(),
            key,
            stake: pick.stake,
            status: BetStatus::Pending,
            placed_at: pick.created_at,
            settled_at: None,
            profit: None,
            result_info: None,
            pick: pick.clone(),
        };
        info!(bet = %bet, ev = format!("{:.2}%", pick.ev_percent), "Recorded new bet");
        self.bets.push(bet.clone());
        Some(bet)
    }

    pub fn len(&self) -> usize {
        self.bets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }

    pub fn all(&self) -> &[Bet] {
        &self.bets
    }

    pub fn get(&self, id: &str) -> Option<&Bet> {
        self.bets.iter().find(|b| b.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Bet> {
        self.bets.iter_mut().find(|b| b.id == id)
    }

    pub fn pending(&self) -> Vec<&Bet> {
        self.bets
            .iter()
            .filter(|b| b.status == BetStatus::Pending)
            .collect()
    }

    pub fn settled(&self) -> Vec<&Bet> {
        self.bets.iter().filter(|b| b.status.is_terminal()).collect()
    }

    pub fn filtered(&self, filter: &LedgerFilter) -> Vec<&Bet> {
        self.bets.iter().filter(|b| filter.matches(b)).collect()
    }

    /// Export the full ledger as CSV, newest entries last.
    pub fn to_csv(&self) -> String {
        let mut out = String::from(
            "id,placed_at,sport,home,away,kickoff,market,selection,price,\
             fair_prob,ev_percent,kelly_full,stake_fraction,books,stake,\
             status,settled_at,profit,result_info\n",
        );
        for bet in &self.bets {
            let p = &bet.pick;
            out.push_str(&format!(
                "{},{},{},{},{},{},{},{},{:.2},{:.4},{:.2},{:.4},{:.4},{},{:.2},{},{},{},{}\n",
                bet.id,
                bet.placed_at.to_rfc3339(),
                csv_field(&p.sport),
                csv_field(&p.home),
                csv_field(&p.away),
                p.kickoff.to_rfc3339(),
                p.market,
                p.selection,
                p.price,
                p.fair_prob,
                p.ev_percent,
                p.kelly_full,
                p.stake_fraction,
                p.books,
                bet.stake,
                bet.status,
                bet.settled_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
                bet.profit.map(|v| format!("{v:.2}")).unwrap_or_default(),
                csv_field(bet.result_info.as_deref().unwrap_or("")),
            ));
        }
        out
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
