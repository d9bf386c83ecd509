//! Dashboard API route handlers.
//!
//! All endpoints return JSON except the CSV export. State is the shared
//! engine behind an `Arc`; every read goes through the same lock that
//! guards bet creation and settlement, so responses are always coherent.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::engine::ScanEngine;
use crate::ledger::settlement::SettleAction;
use crate::ledger::LedgerFilter;
use crate::types::{Bet, BetOutcome, BetStatus, ScoutError};

pub type AppState = Arc<ScanEngine>;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub balance: f64,
    pub initial: f64,
    pub profit: f64,
    pub yield_percent: f64,
    pub halted: bool,
    pub total_bets: usize,
    pub pending: usize,
    pub won: usize,
    pub lost: usize,
    pub void: usize,
    pub win_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub bet_id: String,
    pub outcome: BetOutcome,
}

#[derive(Debug, Serialize)]
pub struct SettleResponse {
    pub bet_id: String,
    pub applied: bool,
    pub profit: Option<f64>,
    pub balance: f64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/status
pub async fn get_status(State(engine): State<AppState>) -> Json<StatusResponse> {
    let bankroll = engine.bankroll().await;
    let bets = engine.bets(&LedgerFilter::default()).await;

    let count = |status: BetStatus| bets.iter().filter(|b| b.status == status).count();
    let won = count(BetStatus::Won);
    let lost = count(BetStatus::Lost);
    let decided = won + lost;
    let win_rate = if decided > 0 {
        won as f64 / decided as f64
    } else {
        0.0
    };

    Json(StatusResponse {
        balance: bankroll.balance,
        initial: bankroll.initial,
        profit: bankroll.profit(),
        yield_percent: bankroll.yield_percent(),
        halted: bankroll.halted,
        total_bets: bets.len(),
        pending: count(BetStatus::Pending),
        won,
        lost,
        void: count(BetStatus::Void),
        win_rate,
    })
}

/// GET /api/ledger?sport=&status=&min_ev=&min_odds=&max_odds=
pub async fn get_ledger(
    State(engine): State<AppState>,
    Query(filter): Query<LedgerFilter>,
) -> Json<Vec<Bet>> {
    Json(engine.bets(&filter).await)
}

/// GET /api/bankroll
pub async fn get_bankroll(State(engine): State<AppState>) -> impl IntoResponse {
    Json(engine.bankroll().await)
}

/// GET /api/export — the full ledger as a CSV download.
pub async fn get_export(State(engine): State<AppState>) -> impl IntoResponse {
    let csv = engine.export_csv().await;
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"bets.csv\"",
            ),
        ],
        csv,
    )
}

/// POST /api/settle — settle one bet by operator request.
pub async fn post_settle(
    State(engine): State<AppState>,
    Json(request): Json<SettleRequest>,
) -> Result<Json<SettleResponse>, (StatusCode, String)> {
    let action = engine
        .settle_manual(&request.bet_id, request.outcome)
        .await
        .map_err(api_error)?;

    let balance = engine.bankroll().await.balance;
    let (applied, profit) = match action {
        SettleAction::Applied(profit) => (true, Some(profit)),
        SettleAction::AlreadySettled => (false, None),
    };

    Ok(Json(SettleResponse {
        bet_id: request.bet_id,
        applied,
        profit,
        balance,
    }))
}

/// POST /api/bankroll/resume — clear the halt flag.
pub async fn post_resume(State(engine): State<AppState>) -> StatusCode {
    engine.resume_bankroll().await;
    StatusCode::NO_CONTENT
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

fn api_error(e: ScoutError) -> (StatusCode, String) {
    let status = match e {
        ScoutError::BetNotFound(_) => StatusCode::NOT_FOUND,
        ScoutError::SettlementConflict { .. } | ScoutError::NegativeBankroll { .. } => {
            StatusCode::CONFLICT
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
