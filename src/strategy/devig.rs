//! Devigger — strip the bookmaker margin from a market's prices.
//!
//! Consensus odds carry an overround: the implied probabilities of a
//! market's selections sum to more than 1.0. Proportional devigging
//! renormalizes them so they sum to exactly 1.0, which is our estimate
//! of the true probabilities.

use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{ScoutError, Selection, MIN_PRICE};

/// Proportionally devig one market's selection → decimal price map.
///
/// implied = 1/price, S = Σ implied, fair = implied / S. Selections with
/// invalid prices are skipped rather than failing the market. Fails when
/// fewer than two valid selections remain or when the overround S is not
/// above 1.0 (a "market" you could arbitrage is a data glitch, not value).
pub fn devig(odds: &BTreeMap<Selection, f64>) -> Result<BTreeMap<Selection, f64>, ScoutError> {
    let mut implied: BTreeMap<Selection, f64> = BTreeMap::new();
    for (&selection, &price) in odds {
        if price < MIN_PRICE || !price.is_finite() {
            debug!(%selection, price, "Skipping invalid price during devig");
            continue;
        }
        implied.insert(selection, 1.0 / price);
    }

    if implied.len() < 2 {
        return Err(ScoutError::InvalidMarket(format!(
            "only {} valid selection(s), need at least 2",
            implied.len()
        )));
    }

    let overround: f64 = implied.values().sum();
    if overround <= 1.0 {
        return Err(ScoutError::InvalidMarket(format!(
            "implied probabilities sum to {overround:.4}, expected > 1.0"
        )));
    }

    Ok(implied
        .into_iter()
        .map(|(sel, p)| (sel, p / overround))
        .collect())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn three_way(home: f64, draw: f64, away: f64) -> BTreeMap<Selection, f64> {
        let mut odds = BTreeMap::new();
        odds.insert(Selection::Home, home);
        odds.insert(Selection::Draw, draw);
        odds.insert(Selection::Away, away);
        odds
    }

    #[test]
    fn test_three_way_devig() {
        // implied: 0.500, 0.294, 0.238 -> S = 1.032
        let fair = devig(&three_way(2.00, 3.40, 4.20)).unwrap();

        assert!((fair[&Selection::Home] - 0.4845).abs() < 5e-4);
        assert!((fair[&Selection::Draw] - 0.2850).abs() < 5e-4);
        assert!((fair[&Selection::Away] - 0.2307).abs() < 5e-4);

        let sum: f64 = fair.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_two_way_devig_sums_to_one() {
        let mut odds = BTreeMap::new();
        odds.insert(Selection::Over, 1.90);
        odds.insert(Selection::Under, 1.90);

        let fair = devig(&odds).unwrap();
        assert!((fair[&Selection::Over] - 0.5).abs() < 1e-10);
        let sum: f64 = fair.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_price_skipped() {
        // Draw price below the floor is dropped, the market still devigs
        let fair = devig(&three_way(2.00, 1.00, 2.10)).unwrap();
        assert_eq!(fair.len(), 2);
        assert!(!fair.contains_key(&Selection::Draw));
        let sum: f64 = fair.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_selection_rejected() {
        let mut odds = BTreeMap::new();
        odds.insert(Selection::Home, 1.50);
        assert!(matches!(devig(&odds), Err(ScoutError::InvalidMarket(_))));
    }

    #[test]
    fn test_no_overround_rejected() {
        // implied sums to exactly 1.0, nothing to strip
        let mut odds = BTreeMap::new();
        odds.insert(Selection::Over, 2.00);
        odds.insert(Selection::Under, 2.00);
        assert!(matches!(devig(&odds), Err(ScoutError::InvalidMarket(_))));
    }

    #[test]
    fn test_arbitrage_prices_rejected() {
        let mut odds = BTreeMap::new();
        odds.insert(Selection::Over, 2.20);
        odds.insert(Selection::Under, 2.20);
        assert!(devig(&odds).is_err());
    }
}
