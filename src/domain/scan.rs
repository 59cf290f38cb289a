//! Batch scan over a list of stocks.
//!
//! Benchmark and breadth series are loaded once and shared read-only; each
//! stock is then loaded, enriched and evaluated independently on the rayon
//! pool.

use crate::domain::breadth::{BreadthBook, BreadthLookup, BreadthSeries, FULL_MARKET_SYMBOL};
use crate::domain::enriched::EnrichedStockQuote;
use crate::domain::enricher::{EnrichOptions, MissingSeriesPolicy, SignalEnricher};
use crate::domain::error::TrendscanError;
use crate::domain::evaluator::{self, DateWindow};
use crate::domain::quote_series::QuoteSeries;
use crate::domain::strategy::EntryStrategy;
use crate::ports::quote_port::QuotePort;
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

pub const DEFAULT_BENCHMARK_SYMBOL: &str = "SPY";

#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolListError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("duplicate symbol: {0}")]
    DuplicateSymbol(String),
}

impl From<SymbolListError> for TrendscanError {
    fn from(err: SymbolListError) -> Self {
        TrendscanError::InvalidInput {
            reason: err.to_string(),
        }
    }
}

pub fn parse_symbols(input: &str) -> Result<Vec<String>, SymbolListError> {
    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(SymbolListError::EmptyToken);
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            return Err(SymbolListError::DuplicateSymbol(symbol));
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub benchmark: String,
    pub full_market_symbol: String,
    pub missing_series: MissingSeriesPolicy,
    /// Applied to reported matches only; enrichment sees the full history.
    pub window: DateWindow,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            benchmark: DEFAULT_BENCHMARK_SYMBOL.to_string(),
            full_market_symbol: FULL_MARKET_SYMBOL.to_string(),
            missing_series: MissingSeriesPolicy::Fail,
            window: DateWindow::default(),
        }
    }
}

impl ScanConfig {
    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            full_market_symbol: self.full_market_symbol.clone(),
            missing_series: self.missing_series,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StockScan {
    pub symbol: String,
    pub sector_symbol: String,
    pub quote_count: usize,
    pub matches: Vec<EnrichedStockQuote>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingSeries { symbol: String },
    DataUnavailable { reason: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingSeries { symbol } => {
                write!(f, "no breadth series found for {}", symbol)
            }
            SkipReason::DataUnavailable { reason } => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStock {
    pub symbol: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Scanned stocks in input symbol order.
    pub stocks: Vec<StockScan>,
    pub skipped: Vec<SkippedStock>,
}

impl ScanOutcome {
    pub fn match_count(&self) -> usize {
        self.stocks.iter().map(|s| s.matches.len()).sum()
    }

    pub fn matches(&self) -> impl Iterator<Item = &EnrichedStockQuote> {
        self.stocks.iter().flat_map(|s| s.matches.iter())
    }
}

/// Breadth series loaded for a scan, remembering symbols whose load failed
/// so that lookups for them surface the failure instead of a plain absence.
#[derive(Debug, Default)]
pub struct LoadedBreadth {
    book: BreadthBook,
    failures: HashMap<String, String>,
}

impl LoadedBreadth {
    pub fn load<P>(source: &P, symbols: &BTreeSet<String>) -> Result<Self, TrendscanError>
    where
        P: QuotePort + ?Sized,
    {
        let mut loaded = LoadedBreadth::default();
        for symbol in symbols {
            match source.fetch_breadth(symbol) {
                Ok(Some(quotes)) => {
                    debug!(symbol = %symbol, quotes = quotes.len(), "loaded breadth series");
                    loaded.book.insert(BreadthSeries::new(symbol.as_str(), quotes)?);
                }
                Ok(None) => debug!(symbol = %symbol, "no breadth series"),
                Err(e) if e.is_data_condition() => {
                    warn!(symbol = %symbol, error = %e, "failed to load breadth series");
                    loaded.failures.insert(symbol.clone(), e.to_string());
                }
                Err(e) => return Err(e),
            }
        }
        Ok(loaded)
    }

    pub fn book(&self) -> &BreadthBook {
        &self.book
    }
}

impl BreadthLookup for LoadedBreadth {
    fn breadth_for(&self, symbol: &str) -> Result<Option<&BreadthSeries>, TrendscanError> {
        if let Some(reason) = self.failures.get(symbol) {
            return Err(TrendscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: reason.clone(),
            });
        }
        self.book.breadth_for(symbol)
    }
}

struct LoadedStock {
    series: QuoteSeries,
    sector_symbol: String,
}

/// Load, enrich and evaluate every symbol against `strategy`.
///
/// A stock that cannot be enriched because of a missing or unreadable series
/// is skipped with a reason. The scan fails when every stock is skipped, or
/// on any other error.
pub fn scan_universe<P, S>(
    source: &P,
    symbols: &[String],
    config: &ScanConfig,
    strategy: &S,
) -> Result<ScanOutcome, TrendscanError>
where
    P: QuotePort + Sync + ?Sized,
    S: EntryStrategy + Sync + ?Sized,
{
    if symbols.is_empty() {
        return Err(TrendscanError::InvalidInput {
            reason: "no symbols to scan".to_string(),
        });
    }

    info!(
        stocks = symbols.len(),
        benchmark = %config.benchmark,
        strategy = strategy.name(),
        "starting scan"
    );

    let benchmark = QuoteSeries::new(
        config.benchmark.as_str(),
        source.fetch_quotes(&config.benchmark)?,
    )?;

    let loaded: Vec<Result<LoadedStock, TrendscanError>> = symbols
        .par_iter()
        .map(|symbol| load_stock(source, symbol))
        .collect();

    let mut breadth_symbols: BTreeSet<String> = BTreeSet::new();
    breadth_symbols.insert(config.full_market_symbol.clone());
    for stock in loaded.iter().flatten() {
        breadth_symbols.insert(stock.sector_symbol.clone());
    }
    let breadth = LoadedBreadth::load(source, &breadth_symbols)?;

    let enricher = SignalEnricher::new(&breadth, &benchmark, config.enrich_options());
    let results: Vec<Result<StockScan, TrendscanError>> = loaded
        .into_par_iter()
        .map(|stock| -> Result<StockScan, TrendscanError> {
            let stock = stock?;
            let quotes = enricher.enrich(&stock.series, &stock.sector_symbol)?;
            let matches = evaluator::matching_within(&quotes, strategy, &config.window)
                .into_iter()
                .cloned()
                .collect();
            Ok(StockScan {
                symbol: stock.series.symbol().to_string(),
                sector_symbol: stock.sector_symbol,
                quote_count: quotes.len(),
                matches,
            })
        })
        .collect();

    let mut outcome = ScanOutcome::default();
    for (symbol, result) in symbols.iter().zip(results) {
        match result {
            Ok(scan) => outcome.stocks.push(scan),
            Err(e) => {
                let reason = match e {
                    TrendscanError::MissingSeries { symbol } => SkipReason::MissingSeries { symbol },
                    TrendscanError::DataUnavailable { reason, .. } => {
                        SkipReason::DataUnavailable { reason }
                    }
                    other => return Err(other),
                };
                warn!(symbol = %symbol, reason = %reason, "skipping stock");
                outcome.skipped.push(SkippedStock {
                    symbol: symbol.clone(),
                    reason,
                });
            }
        }
    }

    if outcome.stocks.is_empty() {
        return Err(TrendscanError::DataUnavailable {
            symbol: "all".to_string(),
            reason: format!("all {} stocks were skipped", symbols.len()),
        });
    }

    info!(
        scanned = outcome.stocks.len(),
        skipped = outcome.skipped.len(),
        matches = outcome.match_count(),
        "scan complete"
    );
    Ok(outcome)
}

fn load_stock<P>(source: &P, symbol: &str) -> Result<LoadedStock, TrendscanError>
where
    P: QuotePort + ?Sized,
{
    let listing = source.fetch_stock(symbol)?;
    debug!(
        symbol,
        sector = %listing.sector_symbol,
        quotes = listing.quotes.len(),
        "loaded stock"
    );
    Ok(LoadedStock {
        series: QuoteSeries::new(listing.symbol, listing.quotes)?,
        sector_symbol: listing.sector_symbol,
    })
}
