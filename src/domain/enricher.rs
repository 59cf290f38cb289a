//! Joins a stock's quotes against sector breadth, full-market breadth and the
//! benchmark series.
//!
//! # Resolution rules
//!
//! - Missing date inside an existing series: resolved to a default
//!   (`false` for uptrend flags, `0.0` for previous heatmaps, `None` for
//!   last-signal dates).
//! - Missing breadth series: governed by [`MissingSeriesPolicy`]; the default
//!   fails with `MissingSeries`.
//! - Lookup error from [`BreadthLookup`]: always propagated.

use crate::domain::breadth::{BreadthLookup, BreadthSeries, FULL_MARKET_SYMBOL};
use crate::domain::enriched::{EnrichedStockQuote, Stock};
use crate::domain::error::TrendscanError;
use crate::domain::quote::{RawQuote, Signal};
use crate::domain::quote_series::QuoteSeries;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Mutex;
use tracing::{debug, warn};

const DEFAULT_PREVIOUS_HEATMAP: f64 = 0.0;

/// What to do when a referenced breadth series does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSeriesPolicy {
    #[default]
    Fail,
    /// Treat every date of the missing series as "not in uptrend".
    AssumeNotInUptrend,
}

impl MissingSeriesPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fail" => Some(MissingSeriesPolicy::Fail),
            "assume-not-in-uptrend" | "assume_not_in_uptrend" => {
                Some(MissingSeriesPolicy::AssumeNotInUptrend)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    pub full_market_symbol: String,
    pub missing_series: MissingSeriesPolicy,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            full_market_symbol: FULL_MARKET_SYMBOL.to_string(),
            missing_series: MissingSeriesPolicy::Fail,
        }
    }
}

/// Shared context for enriching any number of stocks, possibly from several
/// threads at once.
pub struct SignalEnricher<'a, L: BreadthLookup + ?Sized> {
    breadth: &'a L,
    benchmark: &'a QuoteSeries,
    options: EnrichOptions,
    warned: Mutex<HashSet<String>>,
}

impl<'a, L: BreadthLookup + ?Sized> SignalEnricher<'a, L> {
    pub fn new(breadth: &'a L, benchmark: &'a QuoteSeries, options: EnrichOptions) -> Self {
        Self {
            breadth,
            benchmark,
            options,
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn options(&self) -> &EnrichOptions {
        &self.options
    }

    /// One enriched quote per raw quote, in the stock series' own order.
    pub fn enrich(
        &self,
        stock: &QuoteSeries,
        sector_symbol: &str,
    ) -> Result<Vec<EnrichedStockQuote>, TrendscanError> {
        if stock.is_empty() {
            debug!(symbol = stock.symbol(), "no quotes to enrich");
            return Ok(Vec::new());
        }

        let sector = self.resolve_series(sector_symbol)?;
        let market = self.resolve_series(&self.options.full_market_symbol)?;

        let enriched: Vec<EnrichedStockQuote> = stock
            .quotes()
            .iter()
            .map(|raw| self.enrich_quote(stock, raw, sector, market))
            .collect();

        debug!(
            symbol = stock.symbol(),
            sector = sector_symbol,
            quotes = enriched.len(),
            "enriched stock"
        );
        Ok(enriched)
    }

    pub fn enrich_stock(
        &self,
        stock: &QuoteSeries,
        sector_symbol: &str,
    ) -> Result<Stock, TrendscanError> {
        let quotes = self.enrich(stock, sector_symbol)?;
        Ok(Stock::new(stock.symbol(), sector_symbol, quotes))
    }

    fn enrich_quote(
        &self,
        stock: &QuoteSeries,
        raw: &RawQuote,
        sector: Option<&BreadthSeries>,
        market: Option<&BreadthSeries>,
    ) -> EnrichedStockQuote {
        let date = raw.date;
        let (previous_heatmap, previous_sector_heatmap) = previous_heatmaps(stock, date);

        EnrichedStockQuote {
            previous_heatmap,
            previous_sector_heatmap,
            sector_is_in_uptrend: breadth_uptrend_on(sector, date),
            last_buy_signal: stock.most_recent_signal_date_on_or_before(date, Signal::Buy),
            last_sell_signal: stock.most_recent_signal_date_on_or_before(date, Signal::Sell),
            benchmark_signal: self.benchmark.current_signal_on(date),
            benchmark_is_in_uptrend: benchmark_uptrend_on(self.benchmark, date),
            market_is_in_uptrend: breadth_uptrend_on(market, date),
            ..EnrichedStockQuote::from_raw(raw)
        }
    }

    fn resolve_series(&self, symbol: &str) -> Result<Option<&'a BreadthSeries>, TrendscanError> {
        match self.breadth.breadth_for(symbol)? {
            Some(series) => Ok(Some(series)),
            None => match self.options.missing_series {
                MissingSeriesPolicy::Fail => Err(TrendscanError::MissingSeries {
                    symbol: symbol.to_string(),
                }),
                MissingSeriesPolicy::AssumeNotInUptrend => {
                    self.warn_missing_once(symbol);
                    Ok(None)
                }
            },
        }
    }
}

impl<L: BreadthLookup + ?Sized> SignalEnricher<'_, L> {
    fn warn_missing_once(&self, symbol: &str) {
        let first = match self.warned.lock() {
            Ok(mut warned) => warned.insert(symbol.to_string()),
            Err(poisoned) => poisoned.into_inner().insert(symbol.to_string()),
        };
        if first {
            warn!(symbol, "breadth series missing, assuming not in uptrend");
        }
    }
}

/// Enrich a single stock with default options.
pub fn enrich<L: BreadthLookup + ?Sized>(
    stock: &QuoteSeries,
    sector_symbol: &str,
    breadth: &L,
    benchmark: &QuoteSeries,
) -> Result<Vec<EnrichedStockQuote>, TrendscanError> {
    SignalEnricher::new(breadth, benchmark, EnrichOptions::default()).enrich(stock, sector_symbol)
}

/// Heatmap and sector heatmap of the preceding stored quote of the stock
/// itself. The sector heatmap here comes from the stock's own quote, not from
/// the sector breadth series.
fn previous_heatmaps(stock: &QuoteSeries, date: NaiveDate) -> (f64, f64) {
    stock
        .previous_quote(date)
        .map(|prev| (prev.heatmap, prev.sector_heatmap))
        .unwrap_or((DEFAULT_PREVIOUS_HEATMAP, DEFAULT_PREVIOUS_HEATMAP))
}

fn breadth_uptrend_on(series: Option<&BreadthSeries>, date: NaiveDate) -> bool {
    series.and_then(|s| s.uptrend_on(date)).unwrap_or(false)
}

fn benchmark_uptrend_on(benchmark: &QuoteSeries, date: NaiveDate) -> bool {
    benchmark
        .quote_on(date)
        .map(RawQuote::is_in_uptrend)
        .unwrap_or(false)
}
