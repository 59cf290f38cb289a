//! Market-breadth aggregates for a sector, the full market, or a benchmark.

use crate::domain::error::TrendscanError;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Default symbol of the breadth series covering the whole stock universe.
pub const FULL_MARKET_SYMBOL: &str = "FULLSTOCK";

#[derive(Debug, Clone, PartialEq)]
pub struct BreadthQuote {
    pub symbol: String,
    pub date: NaiveDate,
    pub stocks_with_buy_signal: u32,
    pub stocks_with_sell_signal: u32,
    pub stocks_in_uptrend: u32,
    pub stocks_in_neutral: u32,
    pub stocks_in_downtrend: u32,
    /// Percentage of constituents with a buy signal.
    pub bull_percentage: f64,
    pub ema5: f64,
    pub ema10: f64,
    pub ema20: f64,
    pub ema50: f64,
}

impl BreadthQuote {
    /// Bull percentage strictly above its own 10-day EMA.
    pub fn is_in_uptrend(&self) -> bool {
        self.bull_percentage > self.ema10
    }

    pub fn constituents(&self) -> u64 {
        u64::from(self.stocks_in_uptrend)
            + u64::from(self.stocks_in_neutral)
            + u64::from(self.stocks_in_downtrend)
    }
}

#[derive(Debug, Clone)]
pub struct BreadthSeries {
    symbol: String,
    quotes: Vec<BreadthQuote>,
    date_index: HashMap<NaiveDate, usize>,
}

impl BreadthSeries {
    pub fn new(
        symbol: impl Into<String>,
        quotes: Vec<BreadthQuote>,
    ) -> Result<Self, TrendscanError> {
        let symbol = symbol.into();
        let mut date_index = HashMap::with_capacity(quotes.len());
        for (i, quote) in quotes.iter().enumerate() {
            if date_index.insert(quote.date, i).is_some() {
                return Err(TrendscanError::InvalidInput {
                    reason: format!(
                        "duplicate breadth date {} in series {}",
                        quote.date, symbol
                    ),
                });
            }
        }
        Ok(Self {
            symbol,
            quotes,
            date_index,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn quotes(&self) -> &[BreadthQuote] {
        &self.quotes
    }

    pub fn quote_on(&self, date: NaiveDate) -> Option<&BreadthQuote> {
        self.date_index.get(&date).map(|&i| &self.quotes[i])
    }

    pub fn is_in_uptrend(&self, quote: &BreadthQuote) -> bool {
        quote.is_in_uptrend()
    }

    /// Uptrend classification on `date`; `None` when the series has no quote
    /// for that day.
    pub fn uptrend_on(&self, date: NaiveDate) -> Option<bool> {
        self.quote_on(date).map(|q| self.is_in_uptrend(q))
    }
}

/// Keyed access to breadth series.
///
/// `Ok(None)` means no series exists for `symbol`; `Err` means the lookup
/// itself failed.
pub trait BreadthLookup {
    fn breadth_for(&self, symbol: &str) -> Result<Option<&BreadthSeries>, TrendscanError>;
}

/// In-memory breadth series keyed by symbol.
#[derive(Debug, Clone, Default)]
pub struct BreadthBook {
    series: HashMap<String, BreadthSeries>,
}

impl BreadthBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, series: BreadthSeries) {
        self.series.insert(series.symbol().to_string(), series);
    }

    pub fn with_series(mut self, series: BreadthSeries) -> Self {
        self.insert(series);
        self
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = self.series.keys().map(String::as_str).collect();
        symbols.sort_unstable();
        symbols
    }
}

impl BreadthLookup for BreadthBook {
    fn breadth_for(&self, symbol: &str) -> Result<Option<&BreadthSeries>, TrendscanError> {
        Ok(self.series.get(symbol))
    }
}
