//! Settlement Engine — the only path from Pending to a terminal status.
//!
//! `Pending → {Won, Lost, Void}` and nothing else: terminal states never
//! change. Settling is idempotent, so re-reporting the same outcome is a
//! no-op while reporting a different one is a conflict that must be
//! resolved by a human, never by overwriting.

use chrono::Utc;
use tracing::{info, warn};

use super::bankroll::BankrollState;
use super::BetLedger;
use crate::types::{Bet, BetOutcome, MarketType, MatchResult, ScoutError, Selection, TOTAL_GOALS_LINE};

/// What a settlement call actually did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettleAction {
    /// The bet was settled now; carries the profit applied to the bankroll.
    Applied(f64),
    /// The bet already carried this exact outcome. Nothing changed.
    AlreadySettled,
}

/// Map a final result to an outcome for one bet, per its market type.
///
/// `None` means the result cannot decide this bet (a total landing
/// exactly on the line would be a push, impossible at the half-goal
/// line but kept explicit). A cancelled match voids everything on it.
pub fn decide(bet: &Bet, result: &MatchResult) -> Option<BetOutcome> {
    if result.cancelled {
        return Some(BetOutcome::Void);
    }

    let won = match bet.pick.market {
        MarketType::MatchResult => result.winner() == bet.pick.selection,
        MarketType::TotalGoals => {
            let total = result.total_goals() as f64;
            match bet.pick.selection {
                Selection::Over => total > TOTAL_GOALS_LINE,
                Selection::Under => total < TOTAL_GOALS_LINE,
                _ => return None,
            }
        }
        MarketType::BothTeamsToScore => {
            let yes = result.both_scored();
            match bet.pick.selection {
                Selection::Yes => yes,
                Selection::No => !yes,
                _ => return None,
            }
        }
    };

    Some(if won { BetOutcome::Won } else { BetOutcome::Lost })
}

/// Profit/loss for an outcome: won pays stake × (price − 1), lost
/// costs the stake, void returns it untouched.
pub fn profit_for(outcome: BetOutcome, stake: f64, price: f64) -> f64 {
    match outcome {
        BetOutcome::Won => stake * (price - 1.0),
        BetOutcome::Lost => -stake,
        BetOutcome::Void => 0.0,
    }
}

/// Settle one bet and move the bankroll accordingly.
///
/// The bankroll mutation happens first; if it is refused (the loss would
/// drive the balance negative) the bet stays Pending and the error
/// propagates. The bet record is only updated once the money moved.
pub fn settle(
    ledger: &mut BetLedger,
    bankroll: &mut BankrollState,
    bet_id: &str,
    outcome: BetOutcome,
    result_info: Option<String>,
) -> Result<SettleAction, ScoutError> {
    let bet = ledger
        .get_mut(bet_id)
        .ok_or_else(|| ScoutError::BetNotFound(bet_id.to_string()))?;

    if bet.status.is_terminal() {
        if bet.status == outcome.status() {
            return Ok(SettleAction::AlreadySettled);
        }
        warn!(
            bet_id,
            recorded = %bet.status,
            requested = %outcome,
            "Settlement conflict, terminal status stands"
        );
        return Err(ScoutError::SettlementConflict {
            bet_id: bet_id.to_string(),
            recorded: bet.status,
            requested: outcome.status(),
        });
    }

    let profit = profit_for(outcome, bet.stake, bet.pick.price);
    bankroll.apply_settlement(bet_id, profit)?;

    bet.status = outcome.status();
    bet.settled_at = Some(Utc::now());
    bet.profit = Some(profit);
    bet.result_info = result_info;

    info!(
        bet = %bet,
        profit = format!("{profit:+.2}"),
        balance = format!("{:.2}", bankroll.balance),
        "Settled bet"
    );
    Ok(SettleAction::Applied(profit))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
