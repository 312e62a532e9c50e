//! Port traits consumed by the domain and implemented by adapters.

pub mod ledger_port;
pub mod price_port;
pub mod config_port;
