//! Bonus split calculation for an energy retailer.
//!
//! A run reads the day's competitor price snapshot, loads the campaign's
//! reference data from SQLite, works out per tariff, location and
//! consumption range how much new-customer bonus (nc) and instant bonus (ib)
//! is needed to match the market, and stores the result.

pub mod allocation;
pub mod clock;
pub mod config;
pub mod error;
pub mod job;
pub mod model;
pub mod persister;
pub mod snapshot;
pub mod store;
pub mod types;
