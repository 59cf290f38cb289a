//! CSV file quote adapter.
//!
//! Layout under the base path:
//! - `quotes/<SYMBOL>.csv`: one row per stock-day
//! - `breadth/<SYMBOL>.csv`: one row per breadth-day
//! - `sectors.csv`: `symbol,sector` classification

use crate::domain::breadth::BreadthQuote;
use crate::domain::error::TrendscanError;
use crate::domain::quote::{CloseEmas, RawQuote, Signal, Trend};
use crate::ports::quote_port::{QuotePort, StockListing};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize)]
struct QuoteRecord {
    date: String,
    open: f64,
    close: f64,
    heatmap: f64,
    sector_heatmap: f64,
    #[serde(default)]
    signal: Option<String>,
    #[serde(default)]
    trend: Option<String>,
    #[serde(default)]
    ema5: f64,
    #[serde(default)]
    ema10: f64,
    #[serde(default)]
    ema20: f64,
    #[serde(default)]
    ema50: f64,
}

#[derive(Debug, Deserialize)]
struct BreadthRecord {
    date: String,
    stocks_with_buy_signal: u32,
    stocks_with_sell_signal: u32,
    stocks_in_uptrend: u32,
    stocks_in_neutral: u32,
    stocks_in_downtrend: u32,
    bull_percentage: f64,
    ema5: f64,
    ema10: f64,
    ema20: f64,
    ema50: f64,
}

#[derive(Debug, Deserialize)]
struct SectorRecord {
    symbol: String,
    sector: String,
}

pub struct CsvQuoteAdapter {
    base_path: PathBuf,
}

impl CsvQuoteAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn quotes_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("quotes").join(format!("{}.csv", symbol))
    }

    fn breadth_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("breadth").join(format!("{}.csv", symbol))
    }

    fn sectors_path(&self) -> PathBuf {
        self.base_path.join("sectors.csv")
    }

    fn sector_of(&self, symbol: &str) -> Result<String, TrendscanError> {
        let path = self.sectors_path();
        let content = read_file(&path, symbol)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        for row in rdr.deserialize::<SectorRecord>() {
            let row = row.map_err(|e| parse_error(symbol, &path, e))?;
            if row.symbol.trim().eq_ignore_ascii_case(symbol) {
                return Ok(row.sector.trim().to_string());
            }
        }
        Err(TrendscanError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("no sector listed in {}", path.display()),
        })
    }
}

fn read_file(path: &Path, symbol: &str) -> Result<String, TrendscanError> {
    fs::read_to_string(path).map_err(|e| TrendscanError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: format!("failed to read {}: {}", path.display(), e),
    })
}

fn parse_error(symbol: &str, path: &Path, e: csv::Error) -> TrendscanError {
    TrendscanError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: format!("CSV parse error in {}: {}", path.display(), e),
    }
}

fn parse_date(symbol: &str, raw: &str) -> Result<NaiveDate, TrendscanError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TrendscanError::InvalidInput {
            reason: format!("{} record without a date", symbol),
        });
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| TrendscanError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: format!("invalid date '{}': {}", raw, e),
    })
}

impl QuotePort for CsvQuoteAdapter {
    fn fetch_stock(&self, symbol: &str) -> Result<StockListing, TrendscanError> {
        let sector_symbol = self.sector_of(symbol)?;
        let quotes = self.fetch_quotes(symbol)?;
        Ok(StockListing {
            symbol: symbol.to_string(),
            sector_symbol,
            quotes,
        })
    }

    fn fetch_quotes(&self, symbol: &str) -> Result<Vec<RawQuote>, TrendscanError> {
        let path = self.quotes_path(symbol);
        let content = read_file(&path, symbol)?;
        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut quotes = Vec::new();

        for row in rdr.deserialize::<QuoteRecord>() {
            let row = row.map_err(|e| parse_error(symbol, &path, e))?;
            quotes.push(RawQuote {
                symbol: symbol.to_string(),
                date: parse_date(symbol, &row.date)?,
                open: row.open,
                close: row.close,
                heatmap: row.heatmap,
                sector_heatmap: row.sector_heatmap,
                signal: Signal::from_token(row.signal.as_deref()),
                trend: Trend::from_token(row.trend.as_deref()),
                close_emas: CloseEmas {
                    ema5: row.ema5,
                    ema10: row.ema10,
                    ema20: row.ema20,
                    ema50: row.ema50,
                },
            });
        }

        Ok(quotes)
    }

    fn fetch_breadth(&self, symbol: &str) -> Result<Option<Vec<BreadthQuote>>, TrendscanError> {
        let path = self.breadth_path(symbol);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TrendscanError::DataUnavailable {
                    symbol: symbol.to_string(),
                    reason: format!("failed to read {}: {}", path.display(), e),
                });
            }
        };

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut quotes = Vec::new();
        for row in rdr.deserialize::<BreadthRecord>() {
            let row = row.map_err(|e| parse_error(symbol, &path, e))?;
            quotes.push(BreadthQuote {
                symbol: symbol.to_string(),
                date: parse_date(symbol, &row.date)?,
                stocks_with_buy_signal: row.stocks_with_buy_signal,
                stocks_with_sell_signal: row.stocks_with_sell_signal,
                stocks_in_uptrend: row.stocks_in_uptrend,
                stocks_in_neutral: row.stocks_in_neutral,
                stocks_in_downtrend: row.stocks_in_downtrend,
                bull_percentage: row.bull_percentage,
                ema5: row.ema5,
                ema10: row.ema10,
                ema20: row.ema20,
                ema50: row.ema50,
            });
        }

        Ok(Some(quotes))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendscanError> {
        let dir = self.base_path.join("quotes");
        let entries = fs::read_dir(&dir).map_err(|e| TrendscanError::DataUnavailable {
            symbol: "all".to_string(),
            reason: format!("failed to read directory {}: {}", dir.display(), e),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".csv") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
