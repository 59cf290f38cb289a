//! Quote and breadth ingestion port.

use crate::domain::breadth::BreadthQuote;
use crate::domain::error::TrendscanError;
use crate::domain::quote::RawQuote;

/// A stock's quotes together with the sector it is classified under.
#[derive(Debug, Clone, PartialEq)]
pub struct StockListing {
    pub symbol: String,
    pub sector_symbol: String,
    pub quotes: Vec<RawQuote>,
}

pub trait QuotePort {
    fn fetch_stock(&self, symbol: &str) -> Result<StockListing, TrendscanError>;

    /// Quotes only; used for the benchmark, which has no sector.
    fn fetch_quotes(&self, symbol: &str) -> Result<Vec<RawQuote>, TrendscanError>;

    /// `Ok(None)` when the source has no breadth series for `symbol`.
    fn fetch_breadth(&self, symbol: &str) -> Result<Option<Vec<BreadthQuote>>, TrendscanError>;

    fn list_symbols(&self) -> Result<Vec<String>, TrendscanError>;
}
