//! Outreach analytics core for Penguin Mails
//!
//! Statistics primitives, record grouping, rate aggregation and an
//! index-aware fetcher over a keyed metric store.

pub mod cli;
pub mod services;
pub mod types;
