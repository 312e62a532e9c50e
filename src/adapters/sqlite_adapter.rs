//! SQLite store adapter.
//!
//! One pooled database implementing both [`LedgerPort`] and [`PricePort`].
//! Ledger order is the `id` autoincrement, so replay order survives
//! out-of-order timestamps. Timestamps are stored as RFC 3339 TEXT, which
//! sorts chronologically.

use crate::domain::error::FoliovalError;
use crate::domain::ledger::{Transaction, TxKind};
use crate::domain::price::{PricePoint, Resolution};
use crate::domain::timeutil::{format_instant, parse_instant};
use crate::ports::config_port::ConfigPort;
use crate::ports::ledger_port::LedgerPort;
use crate::ports::price_port::PricePort;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FoliovalError> {
        let db_path = config.get_string("store", "sqlite_path").ok_or_else(|| {
            FoliovalError::ConfigMissing {
                section: "store".into(),
                key: "sqlite_path".into(),
            }
        })?;

        let pool_size = config.get_int("store", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, FoliovalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), FoliovalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ts TEXT NOT NULL,
                kind TEXT NOT NULL,
                symbol TEXT NOT NULL,
                quantity REAL NOT NULL
            );
            CREATE TABLE IF NOT EXISTS prices (
                symbol TEXT NOT NULL,
                resolution TEXT NOT NULL,
                ts TEXT NOT NULL,
                close REAL NOT NULL,
                PRIMARY KEY (symbol, resolution, ts)
            );
            CREATE INDEX IF NOT EXISTS idx_prices_symbol_resolution
                ON prices(symbol, resolution);",
        )
        .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    /// Bulk-load one series, replacing points that share a timestamp.
    pub fn insert_points(
        &self,
        symbol: &str,
        resolution: Resolution,
        points: &[PricePoint],
    ) -> Result<(), FoliovalError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        for point in points {
            tx.execute(
                "INSERT OR REPLACE INTO prices (symbol, resolution, ts, close)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    symbol,
                    resolution.code(),
                    format_instant(point.timestamp),
                    point.close
                ],
            )
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }

    /// Bulk-append validated records in one transaction, preserving order.
    pub fn append_all(&self, transactions: &[Transaction]) -> Result<(), FoliovalError> {
        let mut conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        let tx = conn
            .transaction()
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        for record in transactions {
            tx.execute(
                "INSERT INTO transactions (ts, kind, symbol, quantity)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    format_instant(record.timestamp),
                    record.kind.as_str(),
                    record.symbol,
                    record.quantity
                ],
            )
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;
        }

        tx.commit()
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

impl LedgerPort for SqliteAdapter {
    fn append(&self, tx: &Transaction) -> Result<(), FoliovalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        conn.execute(
            "INSERT INTO transactions (ts, kind, symbol, quantity)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                format_instant(tx.timestamp),
                tx.kind.as_str(),
                tx.symbol,
                tx.quantity
            ],
        )
        .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
            reason: e.to_string(),
        })?;

        Ok(())
    }

    fn read_all(&self) -> Result<Vec<Transaction>, FoliovalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare("SELECT ts, kind, symbol, quantity FROM transactions ORDER BY id ASC")
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| {
                let ts_str: String = row.get(0)?;
                let timestamp = parse_instant(&ts_str).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                let kind_str: String = row.get(1)?;
                let kind: TxKind = kind_str.parse().map_err(|e: FoliovalError| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(Transaction {
                    timestamp,
                    kind,
                    symbol: row.get(2)?,
                    quantity: row.get(3)?,
                })
            })
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        let mut transactions = Vec::new();
        for row in rows {
            transactions.push(row.map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(transactions)
    }
}

impl PricePort for SqliteAdapter {
    fn get_series(
        &self,
        symbol: &str,
        resolution: Resolution,
    ) -> Result<Vec<PricePoint>, FoliovalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare(
                "SELECT ts, close FROM prices
                 WHERE symbol = ?1 AND resolution = ?2
                 ORDER BY ts ASC",
            )
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map(params![symbol, resolution.code()], |row| {
                let ts_str: String = row.get(0)?;
                let timestamp = parse_instant(&ts_str).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PricePoint {
                    timestamp,
                    close: row.get(1)?,
                })
            })
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        let mut points = Vec::new();
        for row in rows {
            points.push(row.map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(points)
    }

    fn list_instruments(&self) -> Result<Vec<String>, FoliovalError> {
        let conn = self
            .pool
            .get()
            .map_err(|e: r2d2::Error| FoliovalError::Store {
                reason: e.to_string(),
            })?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM prices ORDER BY symbol")
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(|e: rusqlite::Error| FoliovalError::StoreQuery {
                reason: e.to_string(),
            })?);
        }

        Ok(symbols)
    }
}
