//! Transaction ledger records.
//!
//! The ledger is an append-only, ordered log of ADD/REMOVE records. Records
//! are validated at construction and immutable afterwards; ledger order (not
//! timestamp order) is authoritative for replay.

use crate::domain::error::FoliovalError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Direction of a ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Add,
    Remove,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Add => "ADD",
            TxKind::Remove => "REMOVE",
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxKind {
    type Err = FoliovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ADD" => Ok(TxKind::Add),
            "REMOVE" => Ok(TxKind::Remove),
            other => Err(FoliovalError::InvalidTransaction {
                reason: format!("unknown kind: {other}"),
            }),
        }
    }
}

/// One immutable ledger record.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub timestamp: DateTime<Utc>,
    pub kind: TxKind,
    pub symbol: String,
    pub quantity: f64,
}

impl Transaction {
    /// Validate and normalize a record before it may enter the ledger.
    ///
    /// Symbols are trimmed and uppercased; quantity must be finite and
    /// strictly positive. Rejection here is the only quantity check in the
    /// system: replay assumes every stored record already passed it.
    pub fn new(
        timestamp: DateTime<Utc>,
        kind: TxKind,
        symbol: &str,
        quantity: f64,
    ) -> Result<Self, FoliovalError> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(FoliovalError::InvalidTransaction {
                reason: "empty instrument symbol".to_string(),
            });
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(FoliovalError::InvalidTransaction {
                reason: format!("quantity must be a positive number, got {quantity}"),
            });
        }
        Ok(Transaction {
            timestamp,
            kind,
            symbol,
            quantity,
        })
    }
}
