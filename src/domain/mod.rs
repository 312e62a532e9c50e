//! Core domain types and logic.

pub mod ledger;
pub mod position;
pub mod price;
pub mod range;
pub mod timeutil;
pub mod valuation;
pub mod snapshot;
pub mod error;
