//! Shared types for EV Scout.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, strategy, ledger,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lowest decimal price accepted anywhere in the pipeline.
pub const MIN_PRICE: f64 = 1.01;

/// The fixed goals line for the Over/Under market.
pub const TOTAL_GOALS_LINE: f64 = 2.5;

// ---------------------------------------------------------------------------
// Markets & selections
// ---------------------------------------------------------------------------

/// Market types we scan. Dispatch by market type only changes which
/// selections are compared; devig and EV math are market-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MarketType {
    /// 1X2 — home / draw / away.
    MatchResult,
    /// Over/Under at the fixed 2.5 goals line.
    TotalGoals,
    /// Both teams to score — yes / no.
    BothTeamsToScore,
}

impl MarketType {
    /// All scanned market types (useful for iteration).
    pub const ALL: &'static [MarketType] = &[
        MarketType::MatchResult,
        MarketType::TotalGoals,
        MarketType::BothTeamsToScore,
    ];

    /// The selection set for this market.
    pub fn selections(&self) -> &'static [Selection] {
        match self {
            MarketType::MatchResult => &[Selection::Home, Selection::Draw, Selection::Away],
            MarketType::TotalGoals => &[Selection::Over, Selection::Under],
            MarketType::BothTeamsToScore => &[Selection::Yes, Selection::No],
        }
    }
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::MatchResult => write!(f, "1X2"),
            MarketType::TotalGoals => write!(f, "O/U {TOTAL_GOALS_LINE}"),
            MarketType::BothTeamsToScore => write!(f, "BTTS"),
        }
    }
}

impl std::str::FromStr for MarketType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1x2" | "h2h" | "match_result" => Ok(MarketType::MatchResult),
            "ou" | "o/u" | "over_under" | "total_goals" => Ok(MarketType::TotalGoals),
            "btts" | "both_teams_to_score" => Ok(MarketType::BothTeamsToScore),
            _ => Err(anyhow::anyhow!("Unknown market type: {s}")),
        }
    }
}

/// One priced outcome within a market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Selection {
    Home,
    Draw,
    Away,
    Over,
    Under,
    Yes,
    No,
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::Home => write!(f, "home"),
            Selection::Draw => write!(f, "draw"),
            Selection::Away => write!(f, "away"),
            Selection::Over => write!(f, "over"),
            Selection::Under => write!(f, "under"),
            Selection::Yes => write!(f, "yes"),
            Selection::No => write!(f, "no"),
        }
    }
}

impl std::str::FromStr for Selection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "home" | "1" => Ok(Selection::Home),
            "draw" | "x" | "nul" | "tie" => Ok(Selection::Draw),
            "away" | "2" => Ok(Selection::Away),
            "over" | "plus" => Ok(Selection::Over),
            "under" | "moins" => Ok(Selection::Under),
            "yes" | "oui" => Ok(Selection::Yes),
            "no" | "non" => Ok(Selection::No),
            _ => Err(anyhow::anyhow!("Unknown selection: {s}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Events & quotes
// ---------------------------------------------------------------------------

/// Which of the two independent odds sources a quote came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteSource {
    /// The target bookmaker whose prices we hunt for value.
    Bookmaker,
    /// The multi-book aggregate used to derive fair probabilities.
    Consensus,
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteSource::Bookmaker => write!(f, "bookmaker"),
            QuoteSource::Consensus => write!(f, "consensus"),
        }
    }
}

/// A real-world fixture as known by one source.
///
/// The `id` is source-specific; the Event Matcher pairs bookmaker and
/// consensus events by fuzzy team-name comparison, and once matched the
/// id pair is stable for the event's lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub sport: String,
    pub home: String,
    pub away: String,
    pub kickoff: DateTime<Utc>,
    /// Number of bookmakers backing this event's prices.
    /// Always 1 for the target bookmaker; >1 for consensus events.
    #[serde(default = "default_books")]
    pub books: u32,
}

fn default_books() -> u32 {
    1
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} vs {} ({})",
            self.sport,
            self.home,
            self.away,
            self.kickoff.format("%Y-%m-%d %H:%M"),
        )
    }
}

/// A single odds quote. Immutable once recorded; newer quotes for the
/// same (event, market, selection) key supersede it in the Quote Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsQuote {
    pub source: QuoteSource,
    pub event_id: String,
    pub market: MarketType,
    pub selection: Selection,
    /// Decimal price, must be >= 1.01.
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl OddsQuote {
    /// Whether the quoted price is within the accepted range.
    pub fn is_valid(&self) -> bool {
        self.price >= MIN_PRICE && self.price.is_finite()
    }

    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ScoutError::InvalidQuote { price: self.price })
        }
    }
}

impl fmt::Display for OddsQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {} {} @ {:.2}",
            self.source, self.event_id, self.market, self.selection, self.price,
        )
    }
}

/// Fair (vig-free) probabilities for every selection in one market.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusMarket {
    pub event_id: String,
    pub market: MarketType,
    /// Selection → fair probability. Sums to 1.0 within 1e-6.
    pub probabilities: BTreeMap<Selection, f64>,
    pub books: u32,
}

impl ConsensusMarket {
    /// Fair probability for a selection, if priced.
    pub fn probability(&self, selection: Selection) -> Option<f64> {
        self.probabilities.get(&selection).copied()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Final result of a fixture, as supplied by the external results feed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchResult {
    pub home_goals: u32,
    pub away_goals: u32,
    /// Match cancelled or abandoned — bets on it are void.
    #[serde(default)]
    pub cancelled: bool,
}

impl MatchResult {
    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }

    pub fn both_scored(&self) -> bool {
        self.home_goals > 0 && self.away_goals > 0
    }

    /// The winning 1X2 selection.
    pub fn winner(&self) -> Selection {
        use std::cmp::Ordering;
        match self.home_goals.cmp(&self.away_goals) {
            Ordering::Greater => Selection::Home,
            Ordering::Less => Selection::Away,
            Ordering::Equal => Selection::Draw,
        }
    }
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cancelled {
            write!(f, "cancelled")
        } else {
            write!(f, "{}-{}", self.home_goals, self.away_goals)
        }
    }
}

// ---------------------------------------------------------------------------
// Value bets & ledger entries
// ---------------------------------------------------------------------------

/// A flagged positive-EV opportunity, sized and ready for the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueBet {
    pub sport: String,
    pub home: String,
    pub away: String,
    pub kickoff: DateTime<Utc>,
    /// Source-specific event identifiers, stable once matched.
    pub bookmaker_event_id: String,
    pub consensus_event_id: String,
    pub market: MarketType,
    pub selection: Selection,
    /// The target bookmaker's decimal price.
    pub price: f64,
    /// Devigged fair probability for this selection.
    pub fair_prob: f64,
    /// EV% = (fair_prob × price − 1) × 100. Above the configured
    /// minimum threshold at creation time by construction.
    pub ev_percent: f64,
    /// Raw Kelly fraction f = (bp − q)/b.
    pub kelly_full: f64,
    /// Fraction of bankroll after the fractional multiplier and cap.
    pub stake_fraction: f64,
    /// Recommended stake at decision-time bankroll.
    pub stake: f64,
    /// Bookmakers backing the consensus probabilities.
    pub books: u32,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for ValueBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {} | {} {} @ {:.2} | fair={:.1}% EV={:.2}% stake={:.2}",
            self.home,
            self.away,
            self.market,
            self.selection,
            self.price,
            self.fair_prob * 100.0,
            self.ev_percent,
            self.stake,
        )
    }
}

/// Bet lifecycle status. Pending is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Void,
}

impl BetStatus {
    pub fn is_terminal(&self) -> bool {
        *self != BetStatus::Pending
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetStatus::Pending => write!(f, "pending"),
            BetStatus::Won => write!(f, "won"),
            BetStatus::Lost => write!(f, "lost"),
            BetStatus::Void => write!(f, "void"),
        }
    }
}

/// Outcome reported for a pending bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetOutcome {
    Won,
    Lost,
    Void,
}

impl BetOutcome {
    pub fn status(&self) -> BetStatus {
        match self {
            BetOutcome::Won => BetStatus::Won,
            BetOutcome::Lost => BetStatus::Lost,
            BetOutcome::Void => BetStatus::Void,
        }
    }
}

impl fmt::Display for BetOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status())
    }
}

impl std::str::FromStr for BetOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "won" | "win" => Ok(BetOutcome::Won),
            "lost" | "loss" => Ok(BetOutcome::Lost),
            "void" | "cancelled" => Ok(BetOutcome::Void),
            _ => Err(anyhow::anyhow!("Unknown bet outcome: {s}")),
        }
    }
}

/// A ledger entry. Created once per distinct opportunity per scan day;
/// owned exclusively by the Bet Ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    /// Deterministic dedup key (event, market, selection, price, day).
    pub key: String,
    pub pick: ValueBet,
    /// Stake actually committed at creation time.
    pub stake: f64,
    pub status: BetStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
    /// Realized profit/loss. None until settled.
    pub profit: Option<f64>,
    /// Free-form settlement note (final score, "manual", ...).
    pub result_info: Option<String>,
}

impl Bet {
    /// Gross return if the bet wins (stake × price).
    pub fn potential_return(&self) -> f64 {
        self.stake * self.pick.price
    }
}

impl fmt::Display for Bet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} vs {} | {} {} @ {:.2} | stake={:.2} | {}",
            self.id,
            self.pick.home,
            self.pick.away,
            self.pick.market,
            self.pick.selection,
            self.pick.price,
            self.stake,
            self.status,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for EV Scout.
///
/// `Display` and `Error` are implemented manually: the `source` field on
/// `DataUnavailable` names the odds source, and thiserror's derive would
/// treat a field with that name as the error's cause.
#[derive(Debug)]
pub enum ScoutError {
    DataUnavailable { source: String, message: String },

    MatchAmbiguous(String),

    InvalidMarket(String),

    InvalidQuote { price: f64 },

    BetNotFound(String),

    SettlementConflict {
        bet_id: String,
        recorded: BetStatus,
        requested: BetStatus,
    },

    NegativeBankroll { balance: f64, delta: f64 },

    Config(String),

    Storage(String),
}

impl fmt::Display for ScoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoutError::DataUnavailable { source, message } => {
                write!(f, "Odds source unavailable ({source}): {message}")
            }
            ScoutError::MatchAmbiguous(msg) => write!(f, "Ambiguous event match: {msg}"),
            ScoutError::InvalidMarket(msg) => write!(f, "Invalid market: {msg}"),
            ScoutError::InvalidQuote { price } => {
                write!(f, "Invalid quote: price {price:.2} below {MIN_PRICE}")
            }
            ScoutError::BetNotFound(id) => write!(f, "Bet not found: {id}"),
            ScoutError::SettlementConflict {
                bet_id,
                recorded,
                requested,
            } => write!(
                f,
                "Settlement conflict on bet {bet_id}: recorded {recorded}, requested {requested}"
            ),
            ScoutError::NegativeBankroll { balance, delta } => write!(
                f,
                "Bankroll would go negative: balance {balance:.2}, delta {delta:.2}"
            ),
            ScoutError::Config(msg) => write!(f, "Configuration error: {msg}"),
            ScoutError::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for ScoutError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
