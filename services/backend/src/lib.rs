// Library interface for backend - exposes modules for testing

pub mod config;
pub mod domain;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod repository;
pub mod services;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))
        .route("/health/detailed", get(handlers::health::detailed_health))
        // Users
        .route("/me", get(handlers::users::me))
        .route("/setup/user", post(handlers::users::setup_user))
        // Rounds (admin)
        .route("/admin/round/start", post(handlers::rounds::start_round))
        .route("/admin/round/finish", post(handlers::rounds::finish_round))
        // Bets
        .route("/bet/place", post(handlers::bets::place_bet))
        .route("/bet/cashout", post(handlers::bets::cashout_bet))
        // Deposits
        .route("/deposit/request", post(handlers::transfers::request_deposit))
        .route("/admin/deposits", get(handlers::transfers::list_deposits))
        .route(
            "/admin/deposit/approve",
            post(handlers::transfers::approve_deposit),
        )
        // Withdraws
        .route("/withdraw/request", post(handlers::transfers::request_withdraw))
        .route("/admin/withdraws", get(handlers::transfers::list_withdraws))
        .route(
            "/admin/withdraw/mark-paid",
            post(handlers::transfers::mark_withdraw_paid),
        )
        // Commission
        .route(
            "/admin/commission/report",
            get(handlers::reports::commission_report),
        )
        // Metrics
        .route("/metrics", get(handlers::metrics::metrics_handler))
        // State
        .with_state(state)
        // Middleware
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
