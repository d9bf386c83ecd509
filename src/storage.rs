//! JSON persistence of the ledger and bankroll.
//!
//! The whole mutable state is one serializable struct written to a
//! single file. Saves go through a temp file and an atomic rename so a
//! crash mid-write never leaves a truncated state file behind.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::ledger::bankroll::BankrollState;
use crate::ledger::BetLedger;
use crate::types::ScoutError;

/// Everything that survives a restart: the bet ledger and the bankroll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    pub ledger: BetLedger,
    pub bankroll: BankrollState,
}

impl LedgerState {
    pub fn new(initial_bankroll: f64) -> Self {
        Self {
            ledger: BetLedger::new(),
            bankroll: BankrollState::new(initial_bankroll),
        }
    }
}

/// Write the state file atomically (temp file + rename).
pub fn save_state(path: &Path, state: &LedgerState) -> Result<(), ScoutError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ScoutError::Storage(format!("cannot create {}: {e}", parent.display())))?;
    }

    let json = serde_json::to_string_pretty(state)
        .map_err(|e| ScoutError::Storage(format!("cannot serialize state: {e}")))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json)
        .map_err(|e| ScoutError::Storage(format!("cannot write {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| ScoutError::Storage(format!("cannot rename {}: {e}", tmp.display())))?;

    debug!(file = %path.display(), bets = state.ledger.len(), "Saved state");
    Ok(())
}

/// Load the state file. `Ok(None)` when no file exists yet (first run).
pub fn load_state(path: &Path) -> Result<Option<LedgerState>, ScoutError> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(path)
        .map_err(|e| ScoutError::Storage(format!("cannot read {}: {e}", path.display())))?;
    let state: LedgerState = serde_json::from_str(&contents)
        .map_err(|e| ScoutError::Storage(format!("cannot parse {}: {e}", path.display())))?;

    info!(
        file = %path.display(),
        bets = state.ledger.len(),
        balance = format!("{:.2}", state.bankroll.balance),
        "Restored state"
    );
    Ok(Some(state))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_state_file() -> PathBuf {
        std::env::temp_dir().join(format!("evscout-state-{}.json", Uuid::new_v4()))
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_state_file();
        let mut state = LedgerState::new(1000.0);
        state.bankroll.apply_settlement("b-1", 19.03).unwrap();

        save_state(&path, &state).unwrap();
        let restored = load_state(&path).unwrap().unwrap();
        assert!((restored.bankroll.balance - 1019.03).abs() < 1e-9);
        assert_eq!(restored.bankroll.history.len(), 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let path = temp_state_file();
        assert!(load_state(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let path = temp_state_file();
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_state(&path), Err(ScoutError::Storage(_))));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let path = temp_state_file();
        save_state(&path, &LedgerState::new(100.0)).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("evscout-nested-{}", Uuid::new_v4()));
        let path = dir.join("deep").join("state.json");
        save_state(&path, &LedgerState::new(100.0)).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
