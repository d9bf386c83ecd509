//! Kelly Sizer — fractional Kelly staking with a hard cap.
//!
//! Full Kelly is famously too aggressive against estimated (not true)
//! probabilities, so the applied fraction is a quarter of it by default,
//! and never more than a fixed share of the bankroll.

use serde::{Deserialize, Serialize};

/// Staking parameters, from the `[staking]` config section.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KellySettings {
    /// Multiplier applied to the full Kelly fraction.
    pub kelly_fraction: f64,
    /// Hard ceiling on the fraction of bankroll staked on one bet.
    pub max_stake_pct: f64,
    /// Stakes below this amount are not worth placing.
    pub min_stake: f64,
}

impl Default for KellySettings {
    fn default() -> Self {
        Self {
            kelly_fraction: 0.25,
            max_stake_pct: 0.05,
            min_stake: 0.10,
        }
    }
}

/// A sized stake recommendation.
#[derive(Debug, Clone, Copy)]
pub struct StakePlan {
    /// Raw Kelly fraction f = (bp - q) / b.
    pub kelly_full: f64,
    /// Fraction of bankroll actually staked, in [0, max_stake_pct].
    pub stake_fraction: f64,
    /// Stake amount at the given bankroll.
    pub stake: f64,
}

/// Full Kelly fraction for a decimal price and win probability.
///
/// f = (b·p − q) / b with b = price − 1, q = 1 − p. Negative when the
/// bet has no edge.
pub fn kelly_fraction(price: f64, prob: f64) -> f64 {
    let b = price - 1.0;
    if b <= 0.0 {
        return 0.0;
    }
    (b * prob - (1.0 - prob)) / b
}

/// Size a stake for a positive-EV candidate.
///
/// Returns `None` when no stake should be placed: the edge is not
/// positive, the bankroll is empty, or the resulting amount falls under
/// the minimum stake.
pub fn size_stake(price: f64, prob: f64, bankroll: f64, settings: &KellySettings) -> Option<StakePlan> {
    if bankroll <= 0.0 {
        return None;
    }

    let full = kelly_fraction(price, prob);
    if full <= 0.0 {
        return None;
    }

    let fraction = (full * settings.kelly_fraction).min(settings.max_stake_pct);
    let stake = fraction * bankroll;
    if stake < settings.min_stake {
        return None;
    }

    Some(StakePlan {
        kelly_full: full,
        stake_fraction: fraction,
        stake,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
