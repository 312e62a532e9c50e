//! Request handlers for the JSON API.
//!
//! Handlers stay thin: decode the request, call into the domain through
//! the ports held in [`AppState`], encode the result. Timestamps cross
//! the wire as RFC 3339 strings.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::AppState;
use super::error::ApiError;
use crate::domain::error::FoliovalError;
use crate::domain::ledger::{Transaction, TxKind};
use crate::domain::price::{PricePoint, Resolution};
use crate::domain::range::TimeRange;
use crate::domain::snapshot::{Holding, HoldingsSnapshot, take_snapshot};
use crate::domain::timeutil::{format_instant, parse_instant};
use crate::domain::valuation::{ValuationPoint, price_history, value_series, value_series_between};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct HoldingDto {
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub value: f64,
}

#[derive(Serialize)]
pub struct SnapshotResponse {
    pub holdings: Vec<HoldingDto>,
    pub total: f64,
    pub as_of: String,
}

#[derive(Serialize)]
pub struct ValuationPointDto {
    pub timestamp: String,
    pub value: f64,
}

#[derive(Serialize)]
pub struct PricePointDto {
    pub timestamp: String,
    pub close: f64,
}

#[derive(Serialize)]
pub struct TransactionDto {
    pub timestamp: String,
    pub kind: String,
    pub symbol: String,
    pub quantity: f64,
}

#[derive(Deserialize)]
pub struct NewTransactionRequest {
    /// RFC 3339 instant or bare date. Defaults to now.
    pub timestamp: Option<String>,
    pub kind: String,
    pub symbol: String,
    pub quantity: f64,
}

#[derive(Deserialize)]
pub struct ValuationQuery {
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub resolution: Option<String>,
}

#[derive(Deserialize)]
pub struct PricesQuery {
    pub range: Option<String>,
}

impl From<Holding> for HoldingDto {
    fn from(h: Holding) -> Self {
        Self {
            symbol: h.symbol,
            quantity: h.quantity,
            price: h.price,
            value: h.value,
        }
    }
}

impl From<HoldingsSnapshot> for SnapshotResponse {
    fn from(snap: HoldingsSnapshot) -> Self {
        Self {
            holdings: snap.holdings.into_iter().map(HoldingDto::from).collect(),
            total: snap.total,
            as_of: format_instant(snap.as_of),
        }
    }
}

impl From<ValuationPoint> for ValuationPointDto {
    fn from(p: ValuationPoint) -> Self {
        Self {
            timestamp: format_instant(p.timestamp),
            value: p.value,
        }
    }
}

impl From<PricePoint> for PricePointDto {
    fn from(p: PricePoint) -> Self {
        Self {
            timestamp: format_instant(p.timestamp),
            close: p.close,
        }
    }
}

impl From<Transaction> for TransactionDto {
    fn from(tx: Transaction) -> Self {
        Self {
            timestamp: format_instant(tx.timestamp),
            kind: tx.kind.to_string(),
            symbol: tx.symbol,
            quantity: tx.quantity,
        }
    }
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let ledger = state.ledger.read_all()?;
    let snap = take_snapshot(state.prices.as_ref(), &ledger, Utc::now())?;
    Ok(Json(SnapshotResponse::from(snap)))
}

/// Portfolio value over time. Either `?range=` for a preset window or
/// `?from=&to=&resolution=` for an explicit one.
pub async fn valuation(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ValuationQuery>,
) -> Result<Json<Vec<ValuationPointDto>>, ApiError> {
    let ledger = state.ledger.read_all()?;
    let points = if params.from.is_some() || params.to.is_some() {
        let from = params
            .from
            .ok_or_else(|| ApiError::bad_request("from and to must be given together"))?;
        let to = params
            .to
            .ok_or_else(|| ApiError::bad_request("from and to must be given together"))?;
        let start = parse_instant(&from)?;
        let end = parse_instant(&to)?;
        let resolution = match params.resolution {
            Some(code) => code.parse::<Resolution>()?,
            None => Resolution::Day,
        };
        value_series_between(state.prices.as_ref(), &ledger, resolution, start, end)?
    } else {
        let range = params
            .range
            .ok_or_else(|| ApiError::bad_request("range query parameter is required"))?
            .parse::<TimeRange>()?;
        value_series(state.prices.as_ref(), &ledger, range, Utc::now())?
    };
    Ok(Json(
        points.into_iter().map(ValuationPointDto::from).collect(),
    ))
}

pub async fn instruments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.prices.list_instruments()?))
}

pub async fn instrument_prices(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<PricesQuery>,
) -> Result<Json<Vec<PricePointDto>>, ApiError> {
    let range = params
        .range
        .as_deref()
        .unwrap_or("MAX")
        .parse::<TimeRange>()?;
    let series = price_history(state.prices.as_ref(), &symbol, range, Utc::now())?;
    Ok(Json(series.into_iter().map(PricePointDto::from).collect()))
}

/// Full ledger, newest first.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TransactionDto>>, ApiError> {
    let mut ledger = state.ledger.read_all()?;
    ledger.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(Json(ledger.into_iter().map(TransactionDto::from).collect()))
}

/// Record a transaction and respond with the snapshot it produces.
///
/// An ADD for a symbol the price store has never heard of is rejected,
/// otherwise a typo would sit in the ledger valuing at zero forever.
pub async fn create_transaction(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewTransactionRequest>,
) -> Result<(StatusCode, Json<SnapshotResponse>), ApiError> {
    let timestamp = match body.timestamp.as_deref() {
        Some(raw) => parse_instant(raw)?,
        None => Utc::now(),
    };
    let kind = body.kind.parse::<TxKind>()?;
    let tx = Transaction::new(timestamp, kind, &body.symbol, body.quantity)?;
    if tx.kind == TxKind::Add {
        let known = state.prices.list_instruments()?;
        if !known.contains(&tx.symbol) {
            return Err(FoliovalError::UnknownInstrument { symbol: tx.symbol }.into());
        }
    }
    state.ledger.append(&tx)?;
    let ledger = state.ledger.read_all()?;
    let snap = take_snapshot(state.prices.as_ref(), &ledger, Utc::now())?;
    Ok((StatusCode::CREATED, Json(SnapshotResponse::from(snap))))
}

pub async fn not_found() -> ApiError {
    ApiError::not_found("no such route")
}
