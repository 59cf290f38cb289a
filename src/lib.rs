//! trendscan: sentiment and trend signal scanner for stock quotes.
//!
//! Joins each stock's daily quotes with its sector breadth, full-market
//! breadth and a benchmark series, then filters the enriched days through
//! entry strategies.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
pub mod logging;
