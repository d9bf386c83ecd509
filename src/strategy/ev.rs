//! EV Engine — expected value of a price against a fair probability.

/// Expected value per unit stake, as a percentage.
///
/// `(fair × price − 1) × 100`. A quote priced exactly at fair odds has
/// EV 0; positive means the bookmaker pays more than the consensus says
/// the outcome is worth. Returns `None` for unusable inputs (price below
/// the floor, probability outside (0, 1)).
pub fn ev_percent(price: f64, fair_prob: f64) -> Option<f64> {
    if price < crate::types::MIN_PRICE || !price.is_finite() {
        return None;
    }
    if fair_prob <= 0.0 || fair_prob >= 1.0 || !fair_prob.is_finite() {
        return None;
    }
    Some((fair_prob * price - 1.0) * 100.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ev_worked_example() {
        // 2.10 against a 52% fair probability: 0.52 * 2.10 - 1 = 0.092
        let ev = ev_percent(2.10, 0.52).unwrap();
        assert!((ev - 9.2).abs() < 1e-9);
    }

    #[test]
    fn test_ev_zero_at_fair_price() {
        let ev = ev_percent(2.00, 0.50).unwrap();
        assert!(ev.abs() < 1e-10);
    }

    #[test]
    fn test_ev_negative_below_fair() {
        let ev = ev_percent(1.80, 0.50).unwrap();
        assert!(ev < 0.0);
    }

    #[test]
    fn test_ev_monotone_in_price() {
        let low = ev_percent(2.00, 0.52).unwrap();
        let high = ev_percent(2.20, 0.52).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_ev_monotone_in_probability() {
        let low = ev_percent(2.10, 0.50).unwrap();
        let high = ev_percent(2.10, 0.55).unwrap();
        assert!(high > low);
    }

    #[test]
    fn test_ev_rejects_bad_inputs() {
        assert!(ev_percent(1.00, 0.50).is_none());
        assert!(ev_percent(2.10, 0.0).is_none());
        assert!(ev_percent(2.10, 1.0).is_none());
        assert!(ev_percent(2.10, -0.1).is_none());
        assert!(ev_percent(f64::NAN, 0.5).is_none());
        assert!(ev_percent(2.10, f64::NAN).is_none());
    }
}
