#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::HashMap;
pub use trendscan::domain::breadth::BreadthQuote;
use trendscan::domain::error::TrendscanError;
pub use trendscan::domain::quote::{CloseEmas, RawQuote, Signal, Trend};
use trendscan::ports::quote_port::{QuotePort, StockListing};

/// In-memory quote source keyed by symbol.
pub struct MockQuotePort {
    pub quotes: HashMap<String, Vec<RawQuote>>,
    pub sectors: HashMap<String, String>,
    pub breadth: HashMap<String, Vec<BreadthQuote>>,
    pub errors: HashMap<String, String>,
}

impl MockQuotePort {
    pub fn new() -> Self {
        Self {
            quotes: HashMap::new(),
            sectors: HashMap::new(),
            breadth: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_stock(mut self, symbol: &str, sector: &str, quotes: Vec<RawQuote>) -> Self {
        self.quotes.insert(symbol.to_string(), quotes);
        self.sectors.insert(symbol.to_string(), sector.to_string());
        self
    }

    pub fn with_quotes(mut self, symbol: &str, quotes: Vec<RawQuote>) -> Self {
        self.quotes.insert(symbol.to_string(), quotes);
        self
    }

    pub fn with_breadth(mut self, symbol: &str, quotes: Vec<BreadthQuote>) -> Self {
        self.breadth.insert(symbol.to_string(), quotes);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check_error(&self, symbol: &str) -> Result<(), TrendscanError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(TrendscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl QuotePort for MockQuotePort {
    fn fetch_stock(&self, symbol: &str) -> Result<StockListing, TrendscanError> {
        let quotes = self.fetch_quotes(symbol)?;
        let sector_symbol =
            self.sectors
                .get(symbol)
                .cloned()
                .ok_or_else(|| TrendscanError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: "no sector".to_string(),
                })?;
        Ok(StockListing {
            symbol: symbol.to_string(),
            sector_symbol,
            quotes,
        })
    }

    fn fetch_quotes(&self, symbol: &str) -> Result<Vec<RawQuote>, TrendscanError> {
        self.check_error(symbol)?;
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| TrendscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "no quotes".to_string(),
            })
    }

    fn fetch_breadth(&self, symbol: &str) -> Result<Option<Vec<BreadthQuote>>, TrendscanError> {
        self.check_error(symbol)?;
        Ok(self.breadth.get(symbol).cloned())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendscanError> {
        let mut symbols: Vec<String> = self.sectors.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_quote(
    symbol: &str,
    date: NaiveDate,
    heatmap: f64,
    signal: Option<Signal>,
    trend: Trend,
) -> RawQuote {
    RawQuote {
        symbol: symbol.to_string(),
        date,
        open: 100.0,
        close: 101.0,
        heatmap,
        sector_heatmap: heatmap,
        signal,
        trend,
        close_emas: CloseEmas::default(),
    }
}

/// Breadth day with `bull_percentage` against a fixed 10-day EMA of 40.
pub fn make_breadth(symbol: &str, date: NaiveDate, bull_percentage: f64) -> BreadthQuote {
    BreadthQuote {
        symbol: symbol.to_string(),
        date,
        stocks_with_buy_signal: 140,
        stocks_with_sell_signal: 195,
        stocks_in_uptrend: 222,
        stocks_in_neutral: 59,
        stocks_in_downtrend: 54,
        bull_percentage,
        ema5: 40.0,
        ema10: 40.0,
        ema20: 40.0,
        ema50: 40.0,
    }
}

pub const UPTREND_BULL: f64 = 55.0;
pub const DOWNTREND_BULL: f64 = 30.0;

/// NVDA from 2025-06-02 to 2025-06-05 with a buy signal on 06-03 and a
/// heatmap rising from 10.0 to 13.4 into 06-05. Only 06-05 satisfies every
/// stock-level clause: 06-03 is not in uptrend and 06-04 is getting fearful.
pub fn nvda_quotes() -> Vec<RawQuote> {
    vec![
        make_quote("NVDA", date(2025, 6, 2), 8.0, Some(Signal::Sell), Trend::Downtrend),
        make_quote("NVDA", date(2025, 6, 3), 12.0, Some(Signal::Buy), Trend::Other),
        make_quote("NVDA", date(2025, 6, 4), 10.0, None, Trend::Uptrend),
        make_quote("NVDA", date(2025, 6, 5), 13.4, None, Trend::Uptrend),
    ]
}

/// SPY with a buy signal after its last sell, in uptrend throughout.
pub fn spy_quotes() -> Vec<RawQuote> {
    vec![
        make_quote("SPY", date(2025, 6, 2), 50.0, Some(Signal::Sell), Trend::Uptrend),
        make_quote("SPY", date(2025, 6, 3), 52.0, Some(Signal::Buy), Trend::Uptrend),
        make_quote("SPY", date(2025, 6, 4), 53.0, None, Trend::Uptrend),
        make_quote("SPY", date(2025, 6, 5), 54.0, None, Trend::Uptrend),
    ]
}

pub fn breadth_days(symbol: &str, bull_percentage: f64) -> Vec<BreadthQuote> {
    (2..=5)
        .map(|d| make_breadth(symbol, date(2025, 6, d), bull_percentage))
        .collect()
}

/// Source where NVDA matches the nine-factor strategy on 2025-06-05 only.
pub fn matching_market() -> MockQuotePort {
    MockQuotePort::new()
        .with_stock("NVDA", "XLK", nvda_quotes())
        .with_quotes("SPY", spy_quotes())
        .with_breadth("XLK", breadth_days("XLK", UPTREND_BULL))
        .with_breadth("FULLSTOCK", breadth_days("FULLSTOCK", UPTREND_BULL))
}
