//! Dashboard — Axum web server for monitoring and operator actions.
//!
//! Serves a JSON REST API over the engine's shared state: status
//! summary, filtered ledger, bankroll with balance history, CSV export
//! and manual settlement. CORS enabled for local development.

pub mod routes;

use anyhow::Result;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;

use routes::AppState;

/// Start the dashboard web server.
///
/// This spawns a background task — it doesn't block.
pub fn spawn_dashboard(state: AppState, port: u16) -> Result<()> {
    let app = build_router(state);

    tokio::spawn(async move {
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
        info!(port, "Dashboard server starting on http://localhost:{port}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .expect("Failed to bind dashboard port");

        axum::serve(listener, app)
            .await
            .expect("Dashboard server error");
    });

    Ok(())
}

/// Build the Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin("*".parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/api/status", get(routes::get_status))
        .route("/api/ledger", get(routes::get_ledger))
        .route("/api/bankroll", get(routes::get_bankroll))
        .route("/api/export", get(routes::get_export))
        .route("/api/settle", post(routes::post_settle))
        .route("/api/bankroll/resume", post(routes::post_resume))
        .route("/health", get(routes::health))
        .layer(cors)
        .with_state(state)
}
