#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use folioval::domain::error::FoliovalError;
use folioval::domain::ledger::{Transaction, TxKind};
use folioval::domain::price::{PricePoint, Resolution};
use folioval::ports::ledger_port::LedgerPort;
use folioval::ports::price_port::PricePort;
use std::collections::HashMap;
use std::sync::Mutex;

pub struct MockPricePort {
    pub series: HashMap<(String, Resolution), Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockPricePort {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(
        mut self,
        symbol: &str,
        resolution: Resolution,
        points: Vec<PricePoint>,
    ) -> Self {
        self.series.insert((symbol.to_string(), resolution), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PricePort for MockPricePort {
    fn get_series(
        &self,
        symbol: &str,
        resolution: Resolution,
    ) -> Result<Vec<PricePoint>, FoliovalError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(FoliovalError::StoreQuery {
                reason: reason.clone(),
            });
        }
        Ok(self
            .series
            .get(&(symbol.to_string(), resolution))
            .cloned()
            .unwrap_or_default())
    }

    fn list_instruments(&self) -> Result<Vec<String>, FoliovalError> {
        let mut symbols: Vec<String> = self.series.keys().map(|(s, _)| s.clone()).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }
}

pub struct MemoryLedger {
    records: Mutex<Vec<Transaction>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        Self {
            records: Mutex::new(transactions),
        }
    }
}

impl LedgerPort for MemoryLedger {
    fn append(&self, tx: &Transaction) -> Result<(), FoliovalError> {
        self.records.lock().unwrap().push(tx.clone());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Transaction>, FoliovalError> {
        Ok(self.records.lock().unwrap().clone())
    }
}

pub fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn hour(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn make_point(timestamp: DateTime<Utc>, close: f64) -> PricePoint {
    PricePoint { timestamp, close }
}

pub fn make_tx(timestamp: DateTime<Utc>, kind: TxKind, symbol: &str, quantity: f64) -> Transaction {
    Transaction::new(timestamp, kind, symbol, quantity).unwrap()
}

/// Daily closes walking from `start_close` in `step` increments.
pub fn generate_daily(
    start: DateTime<Utc>,
    count: usize,
    start_close: f64,
    step: f64,
) -> Vec<PricePoint> {
    (0..count)
        .map(|i| PricePoint {
            timestamp: start + Duration::days(i as i64),
            close: start_close + step * i as f64,
        })
        .collect()
}
