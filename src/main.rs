//! EV Scout — positive-EV sports bet finder.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the ledger and bankroll from disk (or starts fresh), and
//! runs the scan and settlement loops with graceful shutdown.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use evscout::config::{AppConfig, FeedKind};
use evscout::dashboard;
use evscout::engine::ScanEngine;
use evscout::feeds::{BookmakerFeed, ConsensusFeed, FileFeed, HttpFeed, ResultsFeed};
use evscout::storage::{self, LedgerState};

const BANNER: &str = r#"
  _______     __  ____                  _
 | ____\ \   / / / ___|  ___ ___  _   _| |_
 |  _|  \ \ / /  \___ \ / __/ _ \| | | | __|
 | |___  \ V /    ___) | (_| (_) | |_| | |_
 |_____|  \_/    |____/ \___\___/ \__,_|\__|

  Positive-EV bet finder with Kelly staking
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load_or_default("config.toml")?;

    init_logging();

    println!("{BANNER}");
    info!(
        scan_interval_secs = cfg.scan.interval_secs,
        settle_interval_secs = cfg.scan.settle_interval_secs,
        sports = ?cfg.scan.sports,
        initial_bankroll = cfg.bankroll.initial,
        auto_bet = cfg.staking.auto_bet,
        "EV Scout starting up"
    );

    // -- Restore or create state -----------------------------------------

    let state_path = Path::new(&cfg.storage.state_file);
    let state = match storage::load_state(state_path)? {
        Some(s) => s,
        None => {
            info!(balance = cfg.bankroll.initial, "Fresh start");
            LedgerState::new(cfg.bankroll.initial)
        }
    };
    let state = Arc::new(Mutex::new(state));

    // -- Feeds -------------------------------------------------------------

    let (bookmaker, consensus, results): (
        Arc<dyn BookmakerFeed>,
        Arc<dyn ConsensusFeed>,
        Arc<dyn ResultsFeed>,
    ) = match cfg.feeds.kind {
        FeedKind::File => {
            info!(path = %cfg.feeds.path, "Using file feeds");
            let feed = Arc::new(FileFeed::new(&cfg.feeds.path));
            (feed.clone(), feed.clone(), feed)
        }
        FeedKind::Http => {
            info!(base_url = %cfg.feeds.base_url, "Using HTTP feeds");
            let feed = Arc::new(HttpFeed::new(&cfg.feeds.base_url));
            (feed.clone(), feed.clone(), feed)
        }
    };

    let engine = Arc::new(ScanEngine::new(&cfg, bookmaker, consensus, results, state));

    // -- Dashboard ---------------------------------------------------------

    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(Arc::clone(&engine), cfg.dashboard.port)?;
    }

    // -- Main loop ---------------------------------------------------------

    let mut scan_tick = tokio::time::interval(Duration::from_secs(cfg.scan.interval_secs));
    let mut settle_tick = tokio::time::interval(Duration::from_secs(cfg.scan.settle_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering main loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = scan_tick.tick() => {
                match engine.run_scan_cycle().await {
                    Ok(report) => {
                        if !report.placed.is_empty() {
                            for bet in &report.placed {
                                info!(bet = %bet, "Placed");
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "Scan cycle skipped"),
                }
            }
            _ = settle_tick.tick() => {
                let report = engine.settle_cycle().await;
                if report.settled > 0 {
                    let bankroll = engine.bankroll().await;
                    info!(
                        balance = format!("{:.2}", bankroll.balance),
                        profit = format!("{:+.2}", bankroll.profit()),
                        "Bankroll updated"
                    );
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Save final state
    {
        let state = engine.shared_state();
        let state = state.lock().await;
        if let Err(e) = storage::save_state(state_path, &state) {
            error!(error = %e, "Failed to save state on shutdown");
        }
        info!(
            balance = format!("{:.2}", state.bankroll.balance),
            bets = state.ledger.len(),
            profit = format!("{:+.2}", state.bankroll.profit()),
            "EV Scout shut down cleanly."
        );
    }

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("evscout=info"));

    let json_logging = std::env::var("EVSCOUT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
