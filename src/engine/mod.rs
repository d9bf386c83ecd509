//! Scan engine — orchestrates the pipeline end to end.
//!
//! A scan cycle fetches both sources, matches events, devigs, filters by
//! EV, sizes stakes, and records new bets. A settlement cycle polls the
//! results feed for pending bets and settles them. Both cycles funnel
//! every ledger and bankroll mutation through one mutex, so bet creation
//! and settlement can never interleave mid-update.

use chrono::{Duration, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::feeds::{BookmakerFeed, ConsensusFeed, ResultsFeed};
use crate::ledger::bankroll::BankrollState;
use crate::ledger::settlement::{self, SettleAction};
use crate::ledger::LedgerFilter;
use crate::matching::EventMatcher;
use crate::quotes::QuoteStore;
use crate::storage::{self, LedgerState};
use crate::strategy::ValueFinder;
use crate::types::{Bet, BetOutcome, Event, QuoteSource, ScoutError};

/// Matches are assumed decidable this long after kickoff. Earlier than
/// that the results feed would return in-play or empty data.
const MATCH_DURATION_HOURS: i64 = 2;

/// Outcome of one scan cycle.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub bookmaker_events: usize,
    pub consensus_events: usize,
    pub matched_pairs: usize,
    pub candidates: usize,
    /// Bets newly recorded this cycle.
    pub placed: Vec<Bet>,
    /// Candidates already in the ledger (normal re-observations).
    pub duplicates: usize,
}

/// Outcome of one settlement cycle.
#[derive(Debug, Default)]
pub struct SettleReport {
    pub checked: usize,
    pub settled: usize,
    pub won: usize,
    pub lost: usize,
    pub void: usize,
    pub profit: f64,
}

pub struct ScanEngine {
    sports: Vec<String>,
    auto_bet: bool,
    matcher: EventMatcher,
    finder: ValueFinder,
    bookmaker: Arc<dyn BookmakerFeed>,
    consensus: Arc<dyn ConsensusFeed>,
    results: Arc<dyn ResultsFeed>,
    state: Arc<Mutex<LedgerState>>,
    /// When set, the state file is rewritten after every mutation.
    state_file: Option<PathBuf>,
}

impl ScanEngine {
    pub fn new(
        config: &AppConfig,
        bookmaker: Arc<dyn BookmakerFeed>,
        consensus: Arc<dyn ConsensusFeed>,
        results: Arc<dyn ResultsFeed>,
        state: Arc<Mutex<LedgerState>>,
    ) -> Self {
        Self {
            sports: config.scan.sports.clone(),
            auto_bet: config.staking.auto_bet,
            matcher: EventMatcher::new(config.matching.matcher_settings()),
            finder: ValueFinder::new(config.staking.strategy_settings()),
            bookmaker,
            consensus,
            results,
            state,
            state_file: Some(PathBuf::from(&config.storage.state_file)),
        }
    }

    /// Disable state-file persistence (tests, dry runs).
    pub fn without_persistence(mut self) -> Self {
        self.state_file = None;
        self
    }

    pub fn shared_state(&self) -> Arc<Mutex<LedgerState>> {
        Arc::clone(&self.state)
    }

    /// Run one full scan cycle over all configured sports.
    ///
    /// Both sources are fetched concurrently; if either is unavailable
    /// the cycle aborts without touching the ledger, and the next tick
    /// simply tries again.
    pub async fn run_scan_cycle(&self) -> Result<ScanReport, ScoutError> {
        let mut report = ScanReport::default();
        let mut store = QuoteStore::new();
        let mut bookmaker_events: Vec<Event> = Vec::new();
        let mut consensus_events: Vec<Event> = Vec::new();
        let mut bookmaker_quotes = Vec::new();
        let mut consensus_quotes = Vec::new();

        for sport in &self.sports {
            let (bk, cs) = tokio::join!(
                self.bookmaker.fetch_quotes(sport),
                self.consensus.fetch_quotes(sport),
            );
            let (bk, cs) = (bk?, cs?);

            debug!(
                sport,
                bookmaker_events = bk.events.len(),
                consensus_events = cs.events.len(),
                "Fetched odds snapshots"
            );
            bookmaker_events.extend(bk.events);
            consensus_events.extend(cs.events);
            bookmaker_quotes.extend(bk.quotes);
            consensus_quotes.extend(cs.quotes);
        }

        store.replace(QuoteSource::Bookmaker, bookmaker_quotes);
        store.replace(QuoteSource::Consensus, consensus_quotes);
        report.bookmaker_events = bookmaker_events.len();
        report.consensus_events = consensus_events.len();

        let pairs = self.matcher.match_events(&bookmaker_events, &consensus_events);
        report.matched_pairs = pairs.len();

        let mut state = self.state.lock().await;
        if state.bankroll.halted {
            warn!("Bankroll is halted, scanning without staking");
            return Ok(report);
        }

        for pair in &pairs {
            let picks = self.finder.find(pair, &store, state.bankroll.balance);
            report.candidates += picks.len();

            for pick in picks {
                if !self.auto_bet {
                    info!(pick = %pick, "Value found (auto_bet off, not recording)");
                    continue;
                }
                match state.ledger.record_if_new(&pick) {
                    Some(bet) => {
                        state.bankroll.commit_stake(bet.stake);
                        report.placed.push(bet);
                    }
                    None => report.duplicates += 1,
                }
            }
        }

        if !report.placed.is_empty() {
            self.persist(&state);
        }
        drop(state);

        info!(
            matched = report.matched_pairs,
            candidates = report.candidates,
            placed = report.placed.len(),
            duplicates = report.duplicates,
            "Scan cycle complete"
        );
        Ok(report)
    }

    /// Run one settlement cycle over all pending bets.
    ///
    /// Results are fetched without holding the state lock; settlements
    /// are applied under it. Feed failures for individual events are
    /// logged and retried next cycle.
    pub async fn settle_cycle(&self) -> SettleReport {
        let mut report = SettleReport::default();
        let now = Utc::now();

        // Snapshot pending bets so the lock is not held across awaits
        let pending: Vec<(String, String, chrono::DateTime<Utc>)> = {
            let state = self.state.lock().await;
            state
                .ledger
                .pending()
                .iter()
                .map(|b| (b.id.clone(), b.pick.bookmaker_event_id.clone(), b.pick.kickoff))
                .collect()
        };

        let mut decided = Vec::new();
        for (bet_id, event_id, kickoff) in pending {
            if kickoff + Duration::hours(MATCH_DURATION_HOURS) > now {
                // Not started or still in play
                continue;
            }
            report.checked += 1;

            match self.results.fetch_result(&event_id).await {
                Ok(Some(result)) => decided.push((bet_id, result)),
                Ok(None) => debug!(%event_id, "No result published yet"),
                Err(e) => warn!(%event_id, error = %e, "Results feed failed for event"),
            }
        }

        let mut state = self.state.lock().await;
        for (bet_id, result) in decided {
            let Some(bet) = state.ledger.get(&bet_id) else {
                continue;
            };
            let Some(outcome) = settlement::decide(bet, &result) else {
                warn!(%bet_id, result = %result, "Result cannot decide bet");
                continue;
            };

            let info = Some(result.to_string());
            let LedgerState { ledger, bankroll } = &mut *state;
            match settlement::settle(ledger, bankroll, &bet_id, outcome, info) {
                Ok(SettleAction::Applied(profit)) => {
                    report.settled += 1;
                    report.profit += profit;
                    match outcome {
                        BetOutcome::Won => report.won += 1,
                        BetOutcome::Lost => report.lost += 1,
                        BetOutcome::Void => report.void += 1,
                    }
                }
                Ok(SettleAction::AlreadySettled) => {}
                Err(e @ ScoutError::NegativeBankroll { .. }) => {
                    error!(%bet_id, error = %e, "Bankroll halted, stopping settlements");
                    break;
                }
                Err(e) => warn!(%bet_id, error = %e, "Settlement failed"),
            }
        }

        if report.settled > 0 {
            self.persist(&state);
        }
        drop(state);

        if report.settled > 0 {
            info!(
                settled = report.settled,
                won = report.won,
                lost = report.lost,
                void = report.void,
                profit = format!("{:+.2}", report.profit),
                "Settlement cycle complete"
            );
        }
        report
    }

    /// Settle one bet by operator request.
    pub async fn settle_manual(
        &self,
        bet_id: &str,
        outcome: BetOutcome,
    ) -> Result<SettleAction, ScoutError> {
        let mut state = self.state.lock().await;
        let LedgerState { ledger, bankroll } = &mut *state;
        let action = settlement::settle(ledger, bankroll, bet_id, outcome, Some("manual".into()))?;
        if matches!(action, SettleAction::Applied(_)) {
            self.persist(&state);
        }
        Ok(action)
    }

    /// Clear the bankroll halt flag by operator request.
    pub async fn resume_bankroll(&self) {
        let mut state = self.state.lock().await;
        state.bankroll.resume();
        self.persist(&state);
        info!("Bankroll resumed by operator");
    }

    pub async fn bankroll(&self) -> BankrollState {
        self.state.lock().await.bankroll.clone()
    }

    pub async fn bets(&self, filter: &LedgerFilter) -> Vec<Bet> {
        let state = self.state.lock().await;
        state.ledger.filtered(filter).into_iter().cloned().collect()
    }

    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.ledger.pending().len()
    }

    pub async fn bet_count(&self) -> usize {
        self.state.lock().await.ledger.len()
    }

    pub async fn export_csv(&self) -> String {
        self.state.lock().await.ledger.to_csv()
    }

    fn persist(&self, state: &LedgerState) {
        if let Some(path) = &self.state_file {
            if let Err(e) = storage::save_state(path, state) {
                error!(error = %e, "Failed to persist state");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::FeedSnapshot;
    use crate::types::{MarketType, MatchResult, OddsQuote, Selection};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct MockOdds {
        snapshot: Option<FeedSnapshot>,
    }

    #[async_trait]
    impl BookmakerFeed for MockOdds {
        async fn fetch_quotes(&self, _sport: &str) -> Result<FeedSnapshot, ScoutError> {
            self.snapshot.clone().ok_or(ScoutError::DataUnavailable {
                source: "bookmaker".into(),
                message: "down".into(),
            })
        }
    }

    #[async_trait]
    impl ConsensusFeed for MockOdds {
        async fn fetch_quotes(&self, _sport: &str) -> Result<FeedSnapshot, ScoutError> {
            self.snapshot.clone().ok_or(ScoutError::DataUnavailable {
                source: "consensus".into(),
                message: "down".into(),
            })
        }
    }

    struct MockResults {
        results: StdMutex<HashMap<String, MatchResult>>,
    }

    #[async_trait]
    impl ResultsFeed for MockResults {
        async fn fetch_result(&self, event_id: &str) -> Result<Option<MatchResult>, ScoutError> {
            Ok(self.results.lock().unwrap().get(event_id).copied())
        }
    }

    fn event(id: &str, kickoff_offset_hours: i64, books: u32) -> Event {
        Event {
            id: id.to_string(),
            sport: "Football".to_string(),
            home: "Lyon".to_string(),
            away: "Lille".to_string(),
            kickoff: Utc::now() + Duration::hours(kickoff_offset_hours),
            books,
        }
    }

    fn quote(source: QuoteSource, event_id: &str, selection: Selection, price: f64) -> OddsQuote {
        OddsQuote {
            source,
            event_id: event_id.to_string(),
            market: MarketType::MatchResult,
            selection,
            price,
            observed_at: Utc::now(),
        }
    }

    /// Bookmaker home price 2.30 against consensus {2.00, 3.40, 4.20}:
    /// one positive-EV candidate.
    fn snapshots(kickoff_offset_hours: i64) -> (FeedSnapshot, FeedSnapshot) {
        let bookmaker = FeedSnapshot {
            events: vec![event("bk-1", kickoff_offset_hours, 1)],
            quotes: vec![quote(QuoteSource::Bookmaker, "bk-1", Selection::Home, 2.30)],
        };
        let consensus = FeedSnapshot {
            events: vec![event("cs-1", kickoff_offset_hours, 5)],
            quotes: vec![
                quote(QuoteSource::Consensus, "cs-1", Selection::Home, 2.00),
                quote(QuoteSource::Consensus, "cs-1", Selection::Draw, 3.40),
                quote(QuoteSource::Consensus, "cs-1", Selection::Away, 4.20),
            ],
        };
        (bookmaker, consensus)
    }

    fn engine(
        bookmaker: Option<FeedSnapshot>,
        consensus: Option<FeedSnapshot>,
        results: HashMap<String, MatchResult>,
        initial_bankroll: f64,
    ) -> ScanEngine {
        let config = AppConfig::default();
        ScanEngine::new(
            &config,
            Arc::new(MockOdds { snapshot: bookmaker }),
            Arc::new(MockOdds { snapshot: consensus }),
            Arc::new(MockResults { results: StdMutex::new(results) }),
            Arc::new(Mutex::new(LedgerState::new(initial_bankroll))),
        )
        .without_persistence()
    }

    #[tokio::test]
    async fn test_scan_places_value_bet() {
        let (bk, cs) = snapshots(6);
        let engine = engine(Some(bk), Some(cs), HashMap::new(), 1000.0);

        let report = engine.run_scan_cycle().await.unwrap();
        assert_eq!(report.matched_pairs, 1);
        assert_eq!(report.candidates, 1);
        assert_eq!(report.placed.len(), 1);
        assert_eq!(engine.pending_count().await, 1);

        // Balance untouched until settlement
        let bankroll = engine.bankroll().await;
        assert!((bankroll.balance - 1000.0).abs() < 1e-10);
        assert!(bankroll.total_staked > 0.0);
    }

    #[tokio::test]
    async fn test_rescan_is_idempotent() {
        let (bk, cs) = snapshots(6);
        let engine = engine(Some(bk), Some(cs), HashMap::new(), 1000.0);

        engine.run_scan_cycle().await.unwrap();
        let second = engine.run_scan_cycle().await.unwrap();
        assert!(second.placed.is_empty());
        assert_eq!(second.duplicates, 1);
        assert_eq!(engine.bet_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_source_aborts_cycle() {
        let (bk, _) = snapshots(6);
        let engine = engine(Some(bk), None, HashMap::new(), 1000.0);

        let err = engine.run_scan_cycle().await.unwrap_err();
        assert!(matches!(err, ScoutError::DataUnavailable { .. }));
        assert_eq!(engine.bet_count().await, 0);
    }

    #[tokio::test]
    async fn test_settle_cycle_pays_winner() {
        // Kickoff far enough in the past that the match is over
        let (bk, cs) = snapshots(-4);
        let mut results = HashMap::new();
        results.insert(
            "bk-1".to_string(),
            MatchResult { home_goals: 2, away_goals: 1, cancelled: false },
        );
        let engine = engine(Some(bk), Some(cs), results, 1000.0);

        let scan = engine.run_scan_cycle().await.unwrap();
        let stake = scan.placed[0].stake;

        let report = engine.settle_cycle().await;
        assert_eq!(report.settled, 1);
        assert_eq!(report.won, 1);
        assert!((report.profit - stake * 1.30).abs() < 1e-9);

        let bankroll = engine.bankroll().await;
        assert!((bankroll.balance - (1000.0 + stake * 1.30)).abs() < 1e-9);
        assert_eq!(engine.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_settle_skips_matches_in_play() {
        let (bk, cs) = snapshots(6);
        let mut results = HashMap::new();
        results.insert(
            "bk-1".to_string(),
            MatchResult { home_goals: 2, away_goals: 1, cancelled: false },
        );
        let engine = engine(Some(bk), Some(cs), results, 1000.0);

        engine.run_scan_cycle().await.unwrap();
        let report = engine.settle_cycle().await;
        assert_eq!(report.checked, 0);
        assert_eq!(report.settled, 0);
        assert_eq!(engine.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_settle_waits_for_result() {
        let (bk, cs) = snapshots(-4);
        let engine = engine(Some(bk), Some(cs), HashMap::new(), 1000.0);

        engine.run_scan_cycle().await.unwrap();
        let report = engine.settle_cycle().await;
        assert_eq!(report.checked, 1);
        assert_eq!(report.settled, 0);
        assert_eq!(engine.pending_count().await, 1);
    }

    #[tokio::test]
    async fn test_halted_bankroll_blocks_staking() {
        let (bk, cs) = snapshots(6);
        let engine = engine(Some(bk), Some(cs), HashMap::new(), 1000.0);
        engine.shared_state().lock().await.bankroll.halted = true;

        let report = engine.run_scan_cycle().await.unwrap();
        assert!(report.placed.is_empty());
        assert_eq!(engine.bet_count().await, 0);

        engine.resume_bankroll().await;
        let report = engine.run_scan_cycle().await.unwrap();
        assert_eq!(report.placed.len(), 1);
    }

    #[tokio::test]
    async fn test_manual_settlement() {
        let (bk, cs) = snapshots(6);
        let engine = engine(Some(bk), Some(cs), HashMap::new(), 1000.0);

        let scan = engine.run_scan_cycle().await.unwrap();
        let bet_id = scan.placed[0].id.clone();
        let stake = scan.placed[0].stake;

        let action = engine.settle_manual(&bet_id, BetOutcome::Lost).await.unwrap();
        assert!(matches!(action, SettleAction::Applied(_)));

        let bankroll = engine.bankroll().await;
        assert!((bankroll.balance - (1000.0 - stake)).abs() < 1e-9);

        // Conflicting manual report is refused
        let err = engine.settle_manual(&bet_id, BetOutcome::Won).await.unwrap_err();
        assert!(matches!(err, ScoutError::SettlementConflict { .. }));
    }
}
