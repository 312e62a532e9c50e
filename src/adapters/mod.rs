//! Concrete adapter implementations for the ports.

#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "web")]
pub mod web;
pub mod csv_ledger_adapter;
pub mod csv_price_adapter;
pub mod file_config_adapter;
