//! Derived positions and ledger replay.
//!
//! A position is never stored; it is recomputed on demand by folding the
//! ledger up to a cutoff instant. Ledger order is authoritative, so replay
//! does not sort by timestamp.

use crate::domain::ledger::{Transaction, TxKind};
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::BTreeMap;

/// Instrument holdings as of a specific instant.
///
/// Quantities are strictly positive; a symbol whose quantity falls to zero is
/// removed from the map entirely. Backed by an ordered map so iteration and
/// summation are deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Position {
    holdings: BTreeMap<String, f64>,
}

impl Position {
    pub fn new() -> Self {
        Position {
            holdings: BTreeMap::new(),
        }
    }

    /// Held quantity for a symbol. Absent symbols hold zero.
    pub fn quantity(&self, symbol: &str) -> f64 {
        self.holdings.get(symbol).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.holdings.contains_key(symbol)
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    /// Holdings in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.holdings.iter().map(|(symbol, &qty)| (symbol.as_str(), qty))
    }

    /// Apply one ledger record.
    ///
    /// A REMOVE larger than the current holding is clamped at zero and the
    /// excess discarded; the clamp is logged but is not an error.
    pub fn apply(&mut self, tx: &Transaction) {
        match tx.kind {
            TxKind::Add => {
                *self.holdings.entry(tx.symbol.clone()).or_insert(0.0) += tx.quantity;
            }
            TxKind::Remove => {
                let held = self.quantity(&tx.symbol);
                if tx.quantity > held {
                    debug!(
                        "remove of {} {} exceeds holding {}, clamping at zero",
                        tx.quantity, tx.symbol, held
                    );
                }
                if held - tx.quantity <= 0.0 {
                    self.holdings.remove(&tx.symbol);
                } else {
                    self.holdings.insert(tx.symbol.clone(), held - tx.quantity);
                }
            }
        }
    }
}

/// Replay the ledger up to and including `cutoff`.
///
/// Only records with `timestamp <= cutoff` participate, applied in ledger
/// order even when their timestamps are out of order. An empty ledger, or a
/// cutoff before the first record, yields an empty position.
pub fn reconstruct(ledger: &[Transaction], cutoff: DateTime<Utc>) -> Position {
    let mut position = Position::new();
    for tx in ledger.iter().filter(|tx| tx.timestamp <= cutoff) {
        position.apply(tx);
    }
    position
}
