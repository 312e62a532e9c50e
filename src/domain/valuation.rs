//! Valuation engine: time-aligned value series over reconstructed positions.
//!
//! The engine walks one reference instrument's price timestamps (the axis),
//! reconstructs the position at each instant, and prices every holding
//! against its own series within a tolerance window. Holdings without a
//! close-enough price contribute zero at that instant; missing data is never
//! an error here.

use crate::domain::error::FoliovalError;
use crate::domain::ledger::Transaction;
use crate::domain::position::reconstruct;
use crate::domain::price::{PricePoint, Resolution, closest_close};
use crate::domain::range::TimeRange;
use crate::ports::price_port::PricePort;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;

/// One output sample: total portfolio value at an axis timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A symbol's series under the range's resolution policy.
///
/// `1D` prefers the hourly series and falls back to daily when the
/// instrument has no hourly data; every other range reads daily. The
/// returned resolution is the one actually used, which also fixes the
/// matching tolerance.
fn series_for_range(
    prices: &dyn PricePort,
    symbol: &str,
    range: TimeRange,
) -> Result<(Vec<PricePoint>, Resolution), FoliovalError> {
    if range == TimeRange::OneDay {
        let hourly = prices.get_series(symbol, Resolution::Hour)?;
        if !hourly.is_empty() {
            return Ok((hourly, Resolution::Hour));
        }
        debug!("{symbol}: no hourly data, falling back to daily");
    }
    let daily = prices.get_series(symbol, Resolution::Day)?;
    Ok((daily, Resolution::Day))
}

/// Walk `axis` and value the reconstructed position at each instant.
///
/// `fetch` resolves a symbol to its series and tolerance resolution; it is
/// called once per distinct symbol.
fn value_at_each<F>(
    ledger: &[Transaction],
    axis: &[DateTime<Utc>],
    mut fetch: F,
) -> Result<Vec<ValuationPoint>, FoliovalError>
where
    F: FnMut(&str) -> Result<(Vec<PricePoint>, Resolution), FoliovalError>,
{
    let mut cache: BTreeMap<String, (Vec<PricePoint>, Resolution)> = BTreeMap::new();
    let mut output = Vec::with_capacity(axis.len());

    for &t in axis {
        let position = reconstruct(ledger, t);
        let mut value = 0.0;
        for (symbol, quantity) in position.iter() {
            if !cache.contains_key(symbol) {
                let series = fetch(symbol)?;
                cache.insert(symbol.to_string(), series);
            }
            let (series, resolution) = &cache[symbol];
            match closest_close(series, t, resolution.tolerance()) {
                Some(close) => value += quantity * close,
                None => debug!("{symbol}: no price within tolerance of {t}, contributing zero"),
            }
        }
        output.push(ValuationPoint { timestamp: t, value });
    }
    Ok(output)
}

/// Portfolio value over the charting range, one point per axis timestamp.
///
/// The axis comes from the first instrument in ascending symbol order with a
/// non-empty series under the range's resolution policy; an empty price
/// store yields an empty output. For every range but `MAX` the axis is
/// trimmed to `now - span`. An empty ledger yields an all-zero series the
/// length of the axis.
pub fn value_series(
    prices: &dyn PricePort,
    ledger: &[Transaction],
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<Vec<ValuationPoint>, FoliovalError> {
    let mut symbols = prices.list_instruments()?;
    symbols.sort();

    let mut axis = Vec::new();
    for symbol in &symbols {
        let (series, _) = series_for_range(prices, symbol, range)?;
        if !series.is_empty() {
            axis = series;
            break;
        }
    }

    let window_start = range.window_start(now);
    let timestamps: Vec<DateTime<Utc>> = axis
        .iter()
        .map(|p| p.timestamp)
        .filter(|t| window_start.map_or(true, |start| *t >= start))
        .collect();

    value_at_each(ledger, &timestamps, |symbol| {
        series_for_range(prices, symbol, range)
    })
}

/// Portfolio value over an explicit window at a fixed resolution.
///
/// The axis is the reference instrument's series at `resolution` restricted
/// to `start..=end`. Rejects windows whose end precedes their start.
pub fn value_series_between(
    prices: &dyn PricePort,
    ledger: &[Transaction],
    resolution: Resolution,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<ValuationPoint>, FoliovalError> {
    if end < start {
        return Err(FoliovalError::InvalidWindow { start, end });
    }

    let mut symbols = prices.list_instruments()?;
    symbols.sort();

    let mut axis = Vec::new();
    for symbol in &symbols {
        let series = prices.get_series(symbol, resolution)?;
        if !series.is_empty() {
            axis = series;
            break;
        }
    }

    let timestamps: Vec<DateTime<Utc>> = axis
        .iter()
        .map(|p| p.timestamp)
        .filter(|t| *t >= start && *t <= end)
        .collect();

    value_at_each(ledger, &timestamps, |symbol| {
        let series = prices.get_series(symbol, resolution)?;
        Ok((series, resolution))
    })
}

/// One instrument's chartable price history for a range.
///
/// Same resolution policy and window filtering as [`value_series`]. A symbol
/// the store has never heard of yields an empty series.
pub fn price_history(
    prices: &dyn PricePort,
    symbol: &str,
    range: TimeRange,
    now: DateTime<Utc>,
) -> Result<Vec<PricePoint>, FoliovalError> {
    let symbol = symbol.trim().to_uppercase();
    let (series, _) = series_for_range(prices, &symbol, range)?;
    let window_start = range.window_start(now);
    Ok(series
        .into_iter()
        .filter(|p| window_start.map_or(true, |start| p.timestamp >= start))
        .collect())
}
