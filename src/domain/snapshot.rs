//! Present-day holdings snapshot.

use crate::domain::error::FoliovalError;
use crate::domain::ledger::Transaction;
use crate::domain::position::reconstruct;
use crate::domain::price::Resolution;
use crate::ports::price_port::PricePort;
use chrono::{DateTime, Utc};
use log::debug;

/// One row of the live portfolio view.
#[derive(Debug, Clone, PartialEq)]
pub struct Holding {
    pub symbol: String,
    pub quantity: f64,
    pub price: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HoldingsSnapshot {
    pub holdings: Vec<Holding>,
    pub total: f64,
    pub as_of: DateTime<Utc>,
}

/// Current holdings with per-instrument market value and total.
///
/// Prices each holding at its most recent daily close. A holding the store
/// has no data for stays visible as a zero-value row instead of being
/// dropped. Rows come back in ascending symbol order.
pub fn take_snapshot(
    prices: &dyn PricePort,
    ledger: &[Transaction],
    now: DateTime<Utc>,
) -> Result<HoldingsSnapshot, FoliovalError> {
    let position = reconstruct(ledger, now);
    let mut holdings = Vec::with_capacity(position.len());
    let mut total = 0.0;

    for (symbol, quantity) in position.iter() {
        let series = prices.get_series(symbol, Resolution::Day)?;
        let price = match series.last() {
            Some(point) => point.close,
            None => {
                debug!("{symbol}: no daily close available, valuing at zero");
                0.0
            }
        };
        let value = quantity * price;
        total += value;
        holdings.push(Holding {
            symbol: symbol.to_string(),
            quantity,
            price,
            value,
        });
    }

    Ok(HoldingsSnapshot {
        holdings,
        total,
        as_of: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ledger::TxKind;
    use crate::domain::price::PricePoint;
    use approx::assert_relative_eq;
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct MapPriceStore {
        daily: HashMap<String, Vec<PricePoint>>,
    }

    impl PricePort for MapPriceStore {
        fn get_series(
            &self,
            symbol: &str,
            resolution: Resolution,
        ) -> Result<Vec<PricePoint>, FoliovalError> {
            if resolution != Resolution::Day {
                return Ok(Vec::new());
            }
            Ok(self.daily.get(symbol).cloned().unwrap_or_default())
        }

        fn list_instruments(&self) -> Result<Vec<String>, FoliovalError> {
            let mut symbols: Vec<String> = self.daily.keys().cloned().collect();
            symbols.sort();
            Ok(symbols)
        }
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn store(closes: &[(&str, &[f64])]) -> MapPriceStore {
        let mut daily = HashMap::new();
        for &(symbol, series) in closes {
            let points = series
                .iter()
                .enumerate()
                .map(|(i, &close)| PricePoint {
                    timestamp: day(i as u32 + 1),
                    close,
                })
                .collect();
            daily.insert(symbol.to_string(), points);
        }
        MapPriceStore { daily }
    }

    fn add(symbol: &str, quantity: f64) -> Transaction {
        Transaction::new(day(1), TxKind::Add, symbol, quantity).unwrap()
    }

    #[test]
    fn prices_holding_at_latest_daily_close() {
        let store = store(&[("AAPL", &[140.0, 145.0, 150.0])]);
        let ledger = vec![add("AAPL", 12.0)];

        let snapshot = take_snapshot(&store, &ledger, day(5)).unwrap();

        assert_eq!(snapshot.holdings.len(), 1);
        let row = &snapshot.holdings[0];
        assert_eq!(row.symbol, "AAPL");
        assert_relative_eq!(row.quantity, 12.0);
        assert_relative_eq!(row.price, 150.0);
        assert_relative_eq!(row.value, 1800.0);
        assert_relative_eq!(snapshot.total, 1800.0);
    }

    #[test]
    fn missing_price_keeps_zero_value_row() {
        let store = store(&[("AAPL", &[100.0])]);
        let ledger = vec![add("AAPL", 2.0), add("GME", 7.0)];

        let snapshot = take_snapshot(&store, &ledger, day(5)).unwrap();

        assert_eq!(snapshot.holdings.len(), 2);
        let gme = &snapshot.holdings[1];
        assert_eq!(gme.symbol, "GME");
        assert_relative_eq!(gme.quantity, 7.0);
        assert_relative_eq!(gme.price, 0.0);
        assert_relative_eq!(gme.value, 0.0);
        assert_relative_eq!(snapshot.total, 200.0);
    }

    #[test]
    fn empty_ledger_is_empty_snapshot() {
        let store = store(&[("AAPL", &[100.0])]);
        let snapshot = take_snapshot(&store, &[], day(5)).unwrap();
        assert!(snapshot.holdings.is_empty());
        assert_relative_eq!(snapshot.total, 0.0);
        assert_eq!(snapshot.as_of, day(5));
    }

    #[test]
    fn rows_are_sorted_by_symbol() {
        let store = store(&[("TSLA", &[200.0]), ("AAPL", &[100.0])]);
        let ledger = vec![add("TSLA", 1.0), add("AAPL", 1.0)];

        let snapshot = take_snapshot(&store, &ledger, day(5)).unwrap();

        let symbols: Vec<&str> = snapshot.holdings.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
        assert_relative_eq!(snapshot.total, 300.0);
    }

    #[test]
    fn adding_never_decreases_total() {
        let store = store(&[("AAPL", &[100.0]), ("TSLA", &[200.0])]);
        let mut ledger = vec![add("AAPL", 1.0)];
        let before = take_snapshot(&store, &ledger, day(5)).unwrap();

        ledger.push(add("TSLA", 0.5));
        let after = take_snapshot(&store, &ledger, day(5)).unwrap();

        assert!(after.total >= before.total);
        assert_relative_eq!(after.total, 200.0);
    }

    #[test]
    fn snapshot_respects_cutoff() {
        let store = store(&[("AAPL", &[100.0])]);
        let ledger = vec![
            Transaction::new(day(1), TxKind::Add, "AAPL", 5.0).unwrap(),
            Transaction::new(day(9), TxKind::Add, "AAPL", 5.0).unwrap(),
        ];

        let snapshot = take_snapshot(&store, &ledger, day(5)).unwrap();

        assert_relative_eq!(snapshot.holdings[0].quantity, 5.0);
    }
}
