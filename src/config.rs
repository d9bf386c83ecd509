//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field carries a serde default so a partial (or missing) file
//! still yields a runnable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::matching::MatcherSettings;
use crate::strategy::StrategySettings;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
    #[serde(default)]
    pub staking: StakingConfig,
    #[serde(default)]
    pub bankroll: BankrollConfig,
    #[serde(default)]
    pub feeds: FeedsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScanConfig {
    pub interval_secs: u64,
    pub settle_interval_secs: u64,
    pub sports: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            settle_interval_secs: 600,
            sports: vec!["Football".to_string()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MatchingConfig {
    pub similarity_threshold: f64,
    pub kickoff_tolerance_hours: i64,
    pub aliases: HashMap<String, String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.55,
            kickoff_tolerance_hours: 26,
            aliases: HashMap::new(),
        }
    }
}

impl MatchingConfig {
    pub fn matcher_settings(&self) -> MatcherSettings {
        MatcherSettings {
            similarity_threshold: self.similarity_threshold,
            kickoff_tolerance_hours: self.kickoff_tolerance_hours,
            aliases: self.aliases.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StakingConfig {
    pub min_ev_percent: f64,
    pub max_ev_percent: f64,
    pub kelly_fraction: f64,
    pub max_stake_pct: f64,
    pub min_stake: f64,
    pub min_books: u32,
    /// When false, opportunities are logged but never recorded as bets.
    pub auto_bet: bool,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            min_ev_percent: 1.0,
            max_ev_percent: 50.0,
            kelly_fraction: 0.25,
            max_stake_pct: 0.05,
            min_stake: 0.10,
            min_books: 3,
            auto_bet: true,
        }
    }
}

impl StakingConfig {
    pub fn strategy_settings(&self) -> StrategySettings {
        StrategySettings {
            min_ev_percent: self.min_ev_percent,
            max_ev_percent: self.max_ev_percent,
            min_books: self.min_books,
            kelly: crate::strategy::KellySettings {
                kelly_fraction: self.kelly_fraction,
                max_stake_pct: self.max_stake_pct,
                min_stake: self.min_stake,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BankrollConfig {
    pub initial: f64,
}

impl Default for BankrollConfig {
    fn default() -> Self {
        Self { initial: 100.0 }
    }
}

/// Where the odds come from. `file` reads JSON snapshots dropped on disk
/// by the scraping process; `http` polls a collaborator endpoint.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FeedsConfig {
    pub kind: FeedKind,
    /// Snapshot directory for the file feed.
    pub path: String,
    /// Base URL for the http feed.
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    File,
    Http,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            kind: FeedKind::File,
            path: "data/feeds".to_string(),
            base_url: "http://127.0.0.1:8200".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub state_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: "data/state.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8100,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.scan.interval_secs, 300);
        assert_eq!(cfg.scan.settle_interval_secs, 600);
        assert!((cfg.matching.similarity_threshold - 0.55).abs() < 1e-10);
        assert_eq!(cfg.matching.kickoff_tolerance_hours, 26);
        assert!((cfg.staking.min_ev_percent - 1.0).abs() < 1e-10);
        assert!((cfg.staking.max_ev_percent - 50.0).abs() < 1e-10);
        assert!((cfg.staking.kelly_fraction - 0.25).abs() < 1e-10);
        assert!((cfg.staking.max_stake_pct - 0.05).abs() < 1e-10);
        assert_eq!(cfg.staking.min_books, 3);
        assert!(cfg.staking.auto_bet);
        assert!((cfg.bankroll.initial - 100.0).abs() < 1e-10);
        assert_eq!(cfg.feeds.kind, FeedKind::File);
        assert!(cfg.dashboard.enabled);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let toml = r#"
            [scan]
            interval_secs = 60

            [staking]
            min_ev_percent = 2.5

            [matching.aliases]
            psg = "paris saint germain"
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.scan.interval_secs, 60);
        assert_eq!(cfg.scan.settle_interval_secs, 600);
        assert!((cfg.staking.min_ev_percent - 2.5).abs() < 1e-10);
        assert!((cfg.staking.kelly_fraction - 0.25).abs() < 1e-10);
        assert_eq!(
            cfg.matching.aliases.get("psg").map(String::as_str),
            Some("paris saint germain")
        );
    }

    #[test]
    fn test_feed_kind_parsing() {
        let toml = r#"
            [feeds]
            kind = "http"
            base_url = "http://odds.example.com"
        "#;
        let cfg: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.feeds.kind, FeedKind::Http);
        assert_eq!(cfg.feeds.base_url, "http://odds.example.com");
    }

    #[test]
    fn test_settings_conversion() {
        let cfg = AppConfig::default();
        let strategy = cfg.staking.strategy_settings();
        assert!((strategy.kelly.max_stake_pct - 0.05).abs() < 1e-10);
        let matcher = cfg.matching.matcher_settings();
        assert!((matcher.similarity_threshold - 0.55).abs() < 1e-10);
    }
}
