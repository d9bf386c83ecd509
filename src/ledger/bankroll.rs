//! Bankroll State — the single virtual balance behind all bets.
//!
//! The balance moves only when a bet settles. Flagging a bet records the
//! stake against the ledger entry but leaves the balance untouched until
//! the outcome is known: won adds stake × (price − 1), lost subtracts the
//! stake, void adds nothing. Every mutation appends a snapshot so the
//! balance history can be replayed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ScoutError;

/// One point in the balance history, appended per settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub at: DateTime<Utc>,
    pub balance: f64,
    /// Profit/loss applied by this settlement.
    pub delta: f64,
    pub bet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankrollState {
    pub initial: f64,
    pub balance: f64,
    /// Sum of stakes committed to flagged bets, settled or not.
    pub total_staked: f64,
    /// Set when a settlement would have driven the balance negative.
    /// No further stakes are placed until an operator clears it.
    pub halted: bool,
    pub history: Vec<BalanceSnapshot>,
}

impl BankrollState {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            balance: initial,
            total_staked: 0.0,
            halted: false,
            history: Vec::new(),
        }
    }

    /// Lifetime profit relative to the starting balance.
    pub fn profit(&self) -> f64 {
        self.balance - self.initial
    }

    /// Profit as a percentage of total amount staked (yield).
    pub fn yield_percent(&self) -> f64 {
        if self.total_staked <= 0.0 {
            0.0
        } else {
            self.profit() / self.total_staked * 100.0
        }
    }

    /// Record a newly committed stake. Does not move the balance.
    pub fn commit_stake(&mut self, stake: f64) {
        self.total_staked += stake;
    }

    /// Apply a settlement's profit/loss to the balance.
    ///
    /// A delta that would leave the balance negative halts the bankroll
    /// and is refused; the caller decides how to reconcile.
    pub fn apply_settlement(&mut self, bet_id: &str, delta: f64) -> Result<(), ScoutError> {
        let next = self.balance + delta;
        if next < 0.0 {
            self.halted = true;
            return Err(ScoutError::NegativeBankroll {
                balance: self.balance,
                delta,
            });
        }

        self.balance = next;
        self.history.push(BalanceSnapshot {
            at: Utc::now(),
            balance: self.balance,
            delta,
            bet_id: bet_id.to_string(),
        });
        Ok(())
    }

    /// Clear the halt flag after operator intervention.
    pub fn resume(&mut self) {
        self.halted = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
