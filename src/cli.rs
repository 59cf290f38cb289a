//! CLI definition and dispatch.
//!
//! Diagnostics go through `tracing` to stderr; results go to stdout.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

use crate::adapters::csv_adapter::CsvQuoteAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_adapter::JsonQuoteAdapter;
use crate::domain::breadth::FULL_MARKET_SYMBOL;
use crate::domain::config_validation::{
    parse_missing_breadth, parse_optional_date, validate_scan_config,
};
use crate::domain::enriched::EnrichedStockQuote;
use crate::domain::enricher::SignalEnricher;
use crate::domain::error::TrendscanError;
use crate::domain::evaluator::DateWindow;
use crate::domain::quote_series::QuoteSeries;
use crate::domain::scan::{
    parse_symbols, scan_universe, LoadedBreadth, ScanConfig, ScanOutcome, DEFAULT_BENCHMARK_SYMBOL,
};
use crate::domain::strategy::{
    available_strategies, strategy_by_name, BoxedStrategy, EntryStrategy, FactorCheck,
    NineFactorEntryStrategy,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::quote_port::QuotePort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "trendscan", about = "Sentiment and trend entry-signal scanner")]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enrich and evaluate every configured stock
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        /// Scan these symbols instead of [scan] symbols
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        strategy: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the enriched record and strategy factors for one stock-day
    Explain {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(short, long)]
        strategy: Option<String>,
    },
    /// List registered entry strategies
    Strategies,
    /// List symbols available in the configured data source
    Symbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Scan {
            config,
            symbol,
            strategy,
            output,
        } => run_scan(&config, symbol.as_deref(), strategy.as_deref(), output.as_deref()),
        Command::Explain {
            config,
            symbol,
            date,
            strategy,
        } => run_explain(&config, &symbol, date, strategy.as_deref()),
        Command::Strategies => {
            run_strategies();
            Ok(())
        }
        Command::Symbols { config } => run_symbols(&config),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendscanError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

pub fn build_scan_config(config: &dyn ConfigPort) -> Result<ScanConfig, TrendscanError> {
    Ok(ScanConfig {
        benchmark: config
            .get_string("scan", "benchmark")
            .map(|s| s.to_uppercase())
            .unwrap_or_else(|| DEFAULT_BENCHMARK_SYMBOL.to_string()),
        full_market_symbol: config
            .get_string("scan", "full_market_symbol")
            .unwrap_or_else(|| FULL_MARKET_SYMBOL.to_string()),
        missing_series: parse_missing_breadth(config)?,
        window: DateWindow {
            start: parse_optional_date(config, "start_date")?,
            end: parse_optional_date(config, "end_date")?,
        },
    })
}

/// `--symbol` wins over `[scan] symbols`.
pub fn resolve_symbols(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, TrendscanError> {
    match symbol_override {
        Some(s) => Ok(parse_symbols(s)?),
        None => {
            let symbols = config.get_list("scan", "symbols");
            if symbols.is_empty() {
                return Err(TrendscanError::ConfigMissing {
                    section: "scan".to_string(),
                    key: "symbols".to_string(),
                });
            }
            Ok(parse_symbols(&symbols.join(","))?)
        }
    }
}

/// `--strategy` wins over `[scan] strategy`; the nine-factor strategy is the
/// default.
pub fn resolve_strategy(
    strategy_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<BoxedStrategy, TrendscanError> {
    let name = strategy_override
        .map(str::to_string)
        .or_else(|| config.get_string("scan", "strategy"))
        .unwrap_or_else(|| NineFactorEntryStrategy::NAME.to_string());
    strategy_by_name(&name)
}

pub fn open_quote_source(
    config: &dyn ConfigPort,
) -> Result<Box<dyn QuotePort + Send + Sync>, TrendscanError> {
    let base_path = config
        .get_string("data", "base_path")
        .ok_or_else(|| TrendscanError::ConfigMissing {
            section: "data".to_string(),
            key: "base_path".to_string(),
        })?;
    let format = config
        .get_string("data", "format")
        .unwrap_or_else(|| "csv".to_string())
        .to_lowercase();

    match format.as_str() {
        "csv" => Ok(Box::new(CsvQuoteAdapter::new(PathBuf::from(base_path)))),
        "json" => Ok(Box::new(JsonQuoteAdapter::new(PathBuf::from(base_path)))),
        other => Err(TrendscanError::ConfigInvalid {
            section: "data".to_string(),
            key: "format".to_string(),
            reason: format!("unsupported format '{}'", other),
        }),
    }
}

fn run_scan(
    config_path: &Path,
    symbol_override: Option<&str>,
    strategy_override: Option<&str>,
    output_override: Option<&Path>,
) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    validate_scan_config(&config, symbol_override.is_none())?;

    let scan_config = build_scan_config(&config)?;
    let symbols = resolve_symbols(symbol_override, &config)?;
    let strategy = resolve_strategy(strategy_override, &config)?;
    let source = open_quote_source(&config)?;

    let output = output_override
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    let outcome = run_scan_pipeline(
        source.as_ref(),
        &symbols,
        &scan_config,
        strategy.as_ref(),
        output.as_deref(),
    )?;

    for quote in outcome.matches() {
        println!("{} {}", quote.symbol, quote.date);
    }
    Ok(())
}

/// Scan, then write the CSV report when an output path is given.
pub fn run_scan_pipeline(
    source: &(dyn QuotePort + Send + Sync),
    symbols: &[String],
    scan_config: &ScanConfig,
    strategy: &(dyn EntryStrategy + Send + Sync),
    output: Option<&Path>,
) -> Result<ScanOutcome, TrendscanError> {
    let outcome = scan_universe(source, symbols, scan_config, strategy)?;

    for skipped in &outcome.skipped {
        info!(symbol = %skipped.symbol, reason = %skipped.reason, "skipped");
    }

    if let Some(path) = output {
        CsvReportAdapter::new().write(&outcome, strategy.name(), path)?;
    }
    Ok(outcome)
}

/// Enriched record and strategy factors for `symbol` on `date`.
pub fn explain_day(
    source: &dyn QuotePort,
    symbol: &str,
    date: NaiveDate,
    scan_config: &ScanConfig,
    strategy: &(dyn EntryStrategy + Send + Sync),
) -> Result<(EnrichedStockQuote, Vec<FactorCheck>), TrendscanError> {
    let symbol = symbol.trim().to_uppercase();
    let listing = source.fetch_stock(&symbol)?;
    let stock = QuoteSeries::new(listing.symbol, listing.quotes)?;
    let benchmark = QuoteSeries::new(
        scan_config.benchmark.as_str(),
        source.fetch_quotes(&scan_config.benchmark)?,
    )?;

    let breadth_symbols: BTreeSet<String> = [
        listing.sector_symbol.clone(),
        scan_config.full_market_symbol.clone(),
    ]
    .into_iter()
    .collect();
    let breadth = LoadedBreadth::load(source, &breadth_symbols)?;

    let enricher = SignalEnricher::new(&breadth, &benchmark, scan_config.enrich_options());
    let enriched = enricher.enrich_stock(&stock, &listing.sector_symbol)?;
    let quote = enriched
        .quote_on(date)
        .cloned()
        .ok_or_else(|| TrendscanError::InvalidInput {
            reason: format!("{} has no quote on {}", symbol, date),
        })?;
    let factors = strategy.factors(&quote);
    Ok((quote, factors))
}

fn run_explain(
    config_path: &Path,
    symbol: &str,
    date: NaiveDate,
    strategy_override: Option<&str>,
) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    validate_scan_config(&config, false)?;
    let scan_config = build_scan_config(&config)?;
    let strategy = resolve_strategy(strategy_override, &config)?;
    let source = open_quote_source(&config)?;

    let (quote, factors) = explain_day(
        source.as_ref(),
        symbol,
        date,
        &scan_config,
        strategy.as_ref(),
    )?;

    println!("{} {} ({})", quote.symbol, quote.date, strategy.name());
    println!("  close:                   {:.2}", quote.close);
    println!(
        "  heatmap:                 {:.2} (previous {:.2})",
        quote.heatmap, quote.previous_heatmap
    );
    println!(
        "  sector heatmap:          {:.2} (previous {:.2})",
        quote.sector_heatmap, quote.previous_sector_heatmap
    );
    println!("  trend:                   {}", quote.trend);
    println!("  last buy signal:         {}", format_date(quote.last_buy_signal));
    println!("  last sell signal:        {}", format_date(quote.last_sell_signal));
    println!("  sector in uptrend:       {}", quote.sector_is_in_uptrend);
    println!("  benchmark signal:        {}", quote.benchmark_signal);
    println!("  benchmark in uptrend:    {}", quote.benchmark_is_in_uptrend);
    println!("  market in uptrend:       {}", quote.market_is_in_uptrend);
    println!();
    for factor in &factors {
        let mark = if factor.passed { "PASS" } else { "FAIL" };
        println!("  [{}] {}", mark, factor.label);
    }
    let matched = strategy.test(&quote);
    println!();
    println!("  match: {}", if matched { "yes" } else { "no" });
    Ok(())
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn run_strategies() {
    for (name, description) in available_strategies() {
        println!("{:<20} {}", name, description);
    }
}

fn run_symbols(config_path: &Path) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    let source = open_quote_source(&config)?;
    let symbols = source.list_symbols()?;
    info!(count = symbols.len(), "symbols available");
    for symbol in symbols {
        println!("{}", symbol);
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TrendscanError> {
    let config = load_config(config_path)?;
    validate_scan_config(&config, false)?;
    let scan_config = build_scan_config(&config)?;
    let strategy = resolve_strategy(None, &config)?;
    info!(
        benchmark = %scan_config.benchmark,
        full_market = %scan_config.full_market_symbol,
        strategy = strategy.name(),
        "config is valid"
    );
    println!("{}: OK", config_path.display());
    Ok(())
}
