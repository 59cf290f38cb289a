//! Core domain types and logic.

pub mod breadth;
pub mod config_validation;
pub mod enriched;
pub mod enricher;
pub mod error;
pub mod evaluator;
pub mod quote;
pub mod quote_series;
pub mod scan;
pub mod strategy;
