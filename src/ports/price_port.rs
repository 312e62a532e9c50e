//! Price series store port trait.

use crate::domain::error::FoliovalError;
use crate::domain::price::{PricePoint, Resolution};

/// Read-only source of per-instrument price series.
///
/// Series come back sorted ascending and unique by timestamp. A symbol the
/// store has no data for yields an empty series, not an error; only actual
/// read failures surface as `Err`.
pub trait PricePort {
    fn get_series(
        &self,
        symbol: &str,
        resolution: Resolution,
    ) -> Result<Vec<PricePoint>, FoliovalError>;

    /// All symbols the store has any data for, ascending.
    fn list_instruments(&self) -> Result<Vec<String>, FoliovalError>;
}
