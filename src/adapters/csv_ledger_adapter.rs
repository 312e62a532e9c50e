//! CSV file ledger adapter.
//!
//! One file, one row per transaction, `timestamp,kind,symbol,quantity`
//! header. Rows are only ever appended, so file order is ledger order.

use crate::domain::error::FoliovalError;
use crate::domain::ledger::{Transaction, TxKind};
use crate::domain::timeutil::{format_instant, parse_instant};
use crate::ports::ledger_port::LedgerPort;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

pub struct CsvLedgerAdapter {
    path: PathBuf,
}

impl CsvLedgerAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl LedgerPort for CsvLedgerAdapter {
    fn append(&self, tx: &Transaction) -> Result<(), FoliovalError> {
        // A missing or zero-length file still needs its header row.
        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FoliovalError::Store {
                reason: format!("failed to open {}: {}", self.path.display(), e),
            })?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            wtr.write_record(["timestamp", "kind", "symbol", "quantity"])
                .map_err(|e| FoliovalError::Store {
                    reason: format!("failed to write header: {}", e),
                })?;
        }

        let timestamp = format_instant(tx.timestamp);
        let quantity = tx.quantity.to_string();
        wtr.write_record([
            timestamp.as_str(),
            tx.kind.as_str(),
            tx.symbol.as_str(),
            quantity.as_str(),
        ])
        .map_err(|e| FoliovalError::Store {
            reason: format!("failed to append transaction: {}", e),
        })?;

        wtr.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Transaction>, FoliovalError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| FoliovalError::Store {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut transactions = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FoliovalError::Store {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| FoliovalError::Store {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = parse_instant(ts_str).map_err(|e| FoliovalError::Store {
                reason: format!("invalid timestamp: {}", e),
            })?;

            let kind: TxKind = record
                .get(1)
                .ok_or_else(|| FoliovalError::Store {
                    reason: "missing kind column".into(),
                })?
                .parse()
                .map_err(|e: FoliovalError| FoliovalError::Store {
                    reason: e.to_string(),
                })?;

            let symbol = record.get(2).ok_or_else(|| FoliovalError::Store {
                reason: "missing symbol column".into(),
            })?;

            let quantity: f64 = record
                .get(3)
                .ok_or_else(|| FoliovalError::Store {
                    reason: "missing quantity column".into(),
                })?
                .parse()
                .map_err(|e| FoliovalError::Store {
                    reason: format!("invalid quantity value: {}", e),
                })?;

            let tx = Transaction::new(timestamp, kind, symbol, quantity).map_err(|e| {
                FoliovalError::Store {
                    reason: format!("invalid ledger row: {}", e),
                }
            })?;
            transactions.push(tx);
        }

        Ok(transactions)
    }
}
