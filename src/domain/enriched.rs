//! Enriched stock-day record and the stock aggregate that owns them.

use crate::domain::evaluator;
use crate::domain::quote::{CloseEmas, RawQuote, Signal, Trend};
use crate::domain::strategy::EntryStrategy;
use chrono::{Duration, NaiveDate};

/// One stock-day joined against its sector, the full market and the benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedStockQuote {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub heatmap: f64,
    pub previous_heatmap: f64,
    pub sector_heatmap: f64,
    pub previous_sector_heatmap: f64,
    pub signal: Option<Signal>,
    pub trend: Trend,
    pub close_emas: CloseEmas,
    pub sector_is_in_uptrend: bool,
    pub last_buy_signal: Option<NaiveDate>,
    pub last_sell_signal: Option<NaiveDate>,
    pub benchmark_signal: Signal,
    pub benchmark_is_in_uptrend: bool,
    pub market_is_in_uptrend: bool,
}

impl EnrichedStockQuote {
    /// Start from a raw quote with every derived field at its default.
    pub fn from_raw(raw: &RawQuote) -> Self {
        Self {
            symbol: raw.symbol.clone(),
            date: raw.date,
            open: raw.open,
            close: raw.close,
            heatmap: raw.heatmap,
            previous_heatmap: 0.0,
            sector_heatmap: raw.sector_heatmap,
            previous_sector_heatmap: 0.0,
            signal: raw.signal,
            trend: raw.trend,
            close_emas: raw.close_emas,
            sector_is_in_uptrend: false,
            last_buy_signal: None,
            last_sell_signal: None,
            benchmark_signal: Signal::Sell,
            benchmark_is_in_uptrend: false,
            market_is_in_uptrend: false,
        }
    }

    pub fn is_in_uptrend(&self) -> bool {
        self.trend == Trend::Uptrend
    }

    pub fn has_buy_signal(&self) -> bool {
        self.signal == Some(Signal::Buy)
    }

    pub fn is_getting_greedier(&self) -> bool {
        self.heatmap > self.previous_heatmap
    }

    pub fn sector_is_getting_greedier(&self) -> bool {
        self.sector_heatmap > self.previous_sector_heatmap
    }

    pub fn has_benchmark_buy_signal(&self) -> bool {
        self.benchmark_signal == Signal::Buy
    }

    /// Last buy signal falls on one of the `days` calendar days before this
    /// quote, or on the quote date itself. A window reaching past the first
    /// representable date covers every earlier day.
    pub fn buy_signal_within(&self, days: i64) -> bool {
        let earliest = Duration::try_days(days)
            .and_then(|window| self.date.checked_sub_signed(window))
            .unwrap_or(NaiveDate::MIN);
        self.last_buy_signal.is_some_and(|buy| buy >= earliest)
    }

    /// Last buy newer than last sell; a missing sell counts as older.
    pub fn buy_signal_is_current(&self) -> bool {
        match (self.last_buy_signal, self.last_sell_signal) {
            (Some(buy), Some(sell)) => buy > sell,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// A stock and the enriched quotes it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub symbol: String,
    pub sector_symbol: String,
    pub quotes: Vec<EnrichedStockQuote>,
}

impl Stock {
    pub fn new(
        symbol: impl Into<String>,
        sector_symbol: impl Into<String>,
        quotes: Vec<EnrichedStockQuote>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            sector_symbol: sector_symbol.into(),
            quotes,
        }
    }

    pub fn quote_on(&self, date: NaiveDate) -> Option<&EnrichedStockQuote> {
        self.quotes.iter().find(|q| q.date == date)
    }

    pub fn quotes_matching<S>(&self, strategy: &S) -> Vec<&EnrichedStockQuote>
    where
        S: EntryStrategy + ?Sized,
    {
        evaluator::matching(&self.quotes, strategy)
    }
}
