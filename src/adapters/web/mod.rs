//! Web service adapter.
//!
//! Serves the engine over HTTP as a small JSON API. Routing and state
//! live here; request decoding and response shaping live in
//! [`handlers`]; error-to-status mapping lives in [`error`].

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::*;

use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_port::PricePort;

pub struct AppState {
    pub ledger: Arc<dyn LedgerPort + Send + Sync>,
    pub prices: Arc<dyn PricePort + Send + Sync>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/snapshot", get(handlers::snapshot))
        .route("/valuation", get(handlers::valuation))
        .route("/instruments", get(handlers::instruments))
        .route(
            "/instruments/{symbol}/prices",
            get(handlers::instrument_prices),
        )
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Install the global tracing subscriber for the serve path.
/// `RUST_LOG` overrides `default_filter`.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
