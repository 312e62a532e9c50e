#![cfg(feature = "web")]
//! JSON API integration tests against the real router.
//!
//! Tests cover:
//! - Every route's happy path and status code
//! - Query validation (missing range, unknown tokens, inverted windows)
//! - Posting transactions and the updated snapshot that comes back
//! - Unknown-instrument rejection on adds
//! - The JSON error body shape and the 404 fallback

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use folioval::adapters::web::{AppState, build_router};
use folioval::domain::ledger::TxKind;
use folioval::domain::price::Resolution;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use common::*;

fn test_app() -> Router {
    let prices = MockPricePort::new()
        .with_series(
            "AAPL",
            Resolution::Day,
            generate_daily(day(2024, 1, 1), 3, 100.0, 10.0),
        )
        .with_series(
            "GME",
            Resolution::Day,
            generate_daily(day(2024, 1, 1), 3, 20.0, 0.0),
        );
    let ledger =
        MemoryLedger::with_transactions(vec![make_tx(day(2024, 1, 1), TxKind::Add, "AAPL", 2.0)]);
    let state = AppState {
        ledger: Arc::new(ledger),
        prices: Arc::new(prices),
    };
    build_router(state)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

mod read_routes {
    use super::*;

    #[tokio::test]
    async fn health_reports_ok() {
        let (status, json) = get_json(test_app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn snapshot_returns_holdings_and_total() {
        let (status, json) = get_json(test_app(), "/snapshot").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["holdings"][0]["symbol"], "AAPL");
        assert!((json["holdings"][0]["quantity"].as_f64().unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((json["total"].as_f64().unwrap() - 240.0).abs() < f64::EPSILON);
        assert!(json["as_of"].is_string());
    }

    #[tokio::test]
    async fn valuation_with_preset_range() {
        let (status, json) = get_json(test_app(), "/valuation?range=MAX").await;
        assert_eq!(status, StatusCode::OK);
        let points = json.as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[0]["value"].as_f64().unwrap() - 200.0).abs() < f64::EPSILON);
        assert!((points[2]["value"].as_f64().unwrap() - 240.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn valuation_without_parameters_is_rejected() {
        let (status, json) = get_json(test_app(), "/valuation").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn valuation_unknown_range_is_rejected() {
        let (status, json) = get_json(test_app(), "/valuation?range=6M").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("6M"));
    }

    #[tokio::test]
    async fn valuation_with_explicit_window() {
        let (status, json) = get_json(
            test_app(),
            "/valuation?from=2024-01-01&to=2024-01-02&resolution=D",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let points = json.as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[1]["value"].as_f64().unwrap() - 220.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn valuation_inverted_window_is_rejected() {
        let (status, json) =
            get_json(test_app(), "/valuation?from=2024-01-05&to=2024-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn instruments_are_listed_sorted() {
        let (status, json) = get_json(test_app(), "/instruments").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!(["AAPL", "GME"]));
    }

    #[tokio::test]
    async fn instrument_prices_default_to_max_range() {
        let (status, json) = get_json(test_app(), "/instruments/AAPL/prices").await;
        assert_eq!(status, StatusCode::OK);
        let points = json.as_array().unwrap();
        assert_eq!(points.len(), 3);
        assert!(points[0]["timestamp"].is_string());
        assert!((points[0]["close"].as_f64().unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn transactions_are_listed_newest_first() {
        let prices = MockPricePort::new().with_series(
            "AAPL",
            Resolution::Day,
            generate_daily(day(2024, 1, 1), 3, 100.0, 10.0),
        );
        let ledger = MemoryLedger::with_transactions(vec![
            make_tx(day(2024, 1, 1), TxKind::Add, "AAPL", 2.0),
            make_tx(day(2024, 1, 2), TxKind::Add, "AAPL", 1.0),
        ]);
        let app = build_router(AppState {
            ledger: Arc::new(ledger),
            prices: Arc::new(prices),
        });

        let (status, json) = get_json(app, "/transactions").await;
        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["timestamp"], "2024-01-02T00:00:00Z");
        assert_eq!(rows[1]["timestamp"], "2024-01-01T00:00:00Z");
        assert_eq!(rows[0]["kind"], "ADD");
    }

    #[tokio::test]
    async fn unknown_route_is_404_with_json_error() {
        let (status, json) = get_json(test_app(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
    }
}

mod write_route {
    use super::*;

    #[tokio::test]
    async fn post_add_returns_created_and_updated_snapshot() {
        let body = serde_json::json!({
            "timestamp": "2024-01-02T00:00:00Z",
            "kind": "ADD",
            "symbol": "AAPL",
            "quantity": 3.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["holdings"][0]["symbol"], "AAPL");
        assert!((json["holdings"][0]["quantity"].as_f64().unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((json["total"].as_f64().unwrap() - 600.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn post_without_timestamp_defaults_to_now() {
        let body = serde_json::json!({
            "kind": "ADD",
            "symbol": "GME",
            "quantity": 1.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::CREATED);
        let symbols: Vec<&str> = json["holdings"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| h["symbol"].as_str().unwrap())
            .collect();
        assert_eq!(symbols, vec!["AAPL", "GME"]);
    }

    #[tokio::test]
    async fn post_remove_beyond_holding_clamps_to_empty() {
        let body = serde_json::json!({
            "timestamp": "2024-01-03T00:00:00Z",
            "kind": "REMOVE",
            "symbol": "AAPL",
            "quantity": 10.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(json["holdings"].as_array().unwrap().is_empty());
        assert!(json["total"].as_f64().unwrap().abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn post_remove_of_unheld_symbol_is_a_noop() {
        let body = serde_json::json!({
            "timestamp": "2024-01-02T00:00:00Z",
            "kind": "REMOVE",
            "symbol": "ZZZZ",
            "quantity": 1.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::CREATED);
        let rows = json["holdings"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["symbol"], "AAPL");
    }

    #[tokio::test]
    async fn post_add_of_unknown_instrument_is_rejected() {
        let body = serde_json::json!({
            "kind": "ADD",
            "symbol": "ZZZZ",
            "quantity": 1.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json["error"].as_str().unwrap().contains("ZZZZ"));
    }

    #[tokio::test]
    async fn post_unknown_kind_is_rejected() {
        let body = serde_json::json!({
            "kind": "HOLD",
            "symbol": "AAPL",
            "quantity": 1.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn post_non_positive_quantity_is_rejected() {
        let body = serde_json::json!({
            "kind": "ADD",
            "symbol": "AAPL",
            "quantity": -4.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn post_malformed_timestamp_is_rejected() {
        let body = serde_json::json!({
            "timestamp": "yesterday",
            "kind": "ADD",
            "symbol": "AAPL",
            "quantity": 1.0,
        });
        let (status, json) = post_json(test_app(), "/transactions", body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("yesterday"));
    }
}
