//! CSV directory price store adapter.
//!
//! One series per file, named `{SYMBOL}_{RES}.csv` with `RES` one of
//! H/D/W/M, header `timestamp,close`. Timestamps are RFC 3339 or bare
//! `YYYY-MM-DD` dates.

use crate::domain::error::FoliovalError;
use crate::domain::price::{PricePoint, Resolution};
use crate::domain::timeutil::parse_instant;
use crate::ports::price_port::PricePort;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;

pub struct CsvPriceAdapter {
    base_path: PathBuf,
}

impl CsvPriceAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn series_path(&self, symbol: &str, resolution: Resolution) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", symbol, resolution.code()))
    }
}

impl PricePort for CsvPriceAdapter {
    fn get_series(
        &self,
        symbol: &str,
        resolution: Resolution,
    ) -> Result<Vec<PricePoint>, FoliovalError> {
        let path = self.series_path(symbol, resolution);
        if !path.exists() {
            // Absent instrument or resolution is a data gap, not a failure.
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&path).map_err(|e| FoliovalError::Store {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        // Ordered map: sorted ascending, unique by timestamp, later rows win.
        let mut by_timestamp: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FoliovalError::Store {
                reason: format!("CSV parse error: {}", e),
            })?;

            let ts_str = record.get(0).ok_or_else(|| FoliovalError::Store {
                reason: "missing timestamp column".into(),
            })?;
            let timestamp = parse_instant(ts_str).map_err(|e| FoliovalError::Store {
                reason: format!("{}: {}", path.display(), e),
            })?;

            let close: f64 = record
                .get(1)
                .ok_or_else(|| FoliovalError::Store {
                    reason: "missing close column".into(),
                })?
                .parse()
                .map_err(|e| FoliovalError::Store {
                    reason: format!("invalid close value: {}", e),
                })?;

            by_timestamp.insert(timestamp, close);
        }

        Ok(by_timestamp
            .into_iter()
            .map(|(timestamp, close)| PricePoint { timestamp, close })
            .collect())
    }

    fn list_instruments(&self) -> Result<Vec<String>, FoliovalError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| FoliovalError::Store {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = BTreeSet::new();

        for entry in entries {
            let entry = entry.map_err(|e| FoliovalError::Store {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            for resolution in Resolution::ALL {
                let suffix = format!("_{}.csv", resolution.code());
                if let Some(symbol) = name_str.strip_suffix(&suffix) {
                    if !symbol.is_empty() {
                        symbols.insert(symbol.to_string());
                    }
                    break;
                }
            }
        }

        Ok(symbols.into_iter().collect())
    }
}
