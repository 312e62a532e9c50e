//! Ledger store port trait.

use crate::domain::error::FoliovalError;
use crate::domain::ledger::Transaction;

/// Append-only transaction log.
///
/// `read_all` returns records in append order, which replay treats as
/// authoritative. Implementations serialize concurrent appends; records are
/// validated by the caller before they reach the port.
pub trait LedgerPort {
    fn append(&self, tx: &Transaction) -> Result<(), FoliovalError>;

    fn read_all(&self) -> Result<Vec<Transaction>, FoliovalError>;
}
