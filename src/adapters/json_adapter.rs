//! Vendor JSON payload adapter.
//!
//! Reads the payloads exactly as the data vendor returns them:
//! - `<SYMBOL>.json`: `stkDetail` header plus the `lst_h` quote history
//! - `breadth/<SYMBOL>.json`: `lst_h` breadth history
//!
//! Vendor timestamps (`2025-06-05T00:00:00`) are reduced to their date.

use crate::domain::breadth::BreadthQuote;
use crate::domain::error::TrendscanError;
use crate::domain::quote::{CloseEmas, RawQuote, Signal, Trend};
use crate::ports::quote_port::{QuotePort, StockListing};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct StockPayload {
    #[serde(rename = "stkDetail", default)]
    detail: Option<StockDetail>,
    #[serde(rename = "lst_h", default)]
    quotes: Vec<StockQuotePayload>,
}

#[derive(Debug, Deserialize)]
struct StockDetail {
    #[serde(rename = "stockSymbol")]
    symbol: Option<String>,
    #[serde(rename = "sectorSymbol")]
    sector_symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StockQuotePayload {
    #[serde(rename = "quotedate")]
    date: Option<String>,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    close: Option<f64>,
    #[serde(rename = "oscillator", default)]
    heatmap: Option<f64>,
    #[serde(rename = "net_weighted_FG_display", default)]
    sector_heatmap: Option<f64>,
    #[serde(rename = "final_calls", default)]
    signal: Option<String>,
    #[serde(rename = "tooltip", default)]
    trend: Option<String>,
    #[serde(rename = "closePrice_EMA5", default)]
    ema5: Option<f64>,
    #[serde(rename = "closePrice_EMA10", default)]
    ema10: Option<f64>,
    #[serde(rename = "closePrice_EMA20", default)]
    ema20: Option<f64>,
    #[serde(rename = "closePrice_EMA50", default)]
    ema50: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BreadthPayload {
    #[serde(rename = "lst_h", default)]
    quotes: Option<Vec<BreadthQuotePayload>>,
}

#[derive(Debug, Deserialize)]
struct BreadthQuotePayload {
    #[serde(rename = "Quotedate")]
    date: Option<String>,
    #[serde(rename = "Bull_Total", default)]
    bull_total: Option<u32>,
    #[serde(rename = "Bear_Total", default)]
    bear_total: Option<u32>,
    #[serde(rename = "Uptrend", default)]
    uptrend: Option<u32>,
    #[serde(rename = "Neutral", default)]
    neutral: Option<u32>,
    #[serde(rename = "Downtrend", default)]
    downtrend: Option<u32>,
    #[serde(rename = "Bull_per", default)]
    bull_per: Option<f64>,
    #[serde(rename = "Bull_EMA_5", default)]
    ema5: Option<f64>,
    #[serde(rename = "Bull_EMA_10", default)]
    ema10: Option<f64>,
    #[serde(rename = "Bull_EMA_20", default)]
    ema20: Option<f64>,
    #[serde(rename = "Bull_EMA_50", default)]
    ema50: Option<f64>,
}

pub struct JsonQuoteAdapter {
    base_path: PathBuf,
}

impl JsonQuoteAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn stock_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", symbol))
    }

    fn breadth_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join("breadth").join(format!("{}.json", symbol))
    }

    fn read_stock(&self, symbol: &str) -> Result<StockPayload, TrendscanError> {
        let path = self.stock_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| TrendscanError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        parse_payload(symbol, &path, &content)
    }
}

fn parse_payload<T: DeserializeOwned>(
    symbol: &str,
    path: &Path,
    content: &str,
) -> Result<T, TrendscanError> {
    serde_json::from_str(content).map_err(|e| TrendscanError::DataUnavailable {
        symbol: symbol.to_string(),
        reason: format!("JSON parse error in {}: {}", path.display(), e),
    })
}

/// Vendor timestamps carry a midnight time component; plain dates are also
/// accepted.
fn parse_vendor_date(symbol: &str, raw: Option<&str>) -> Result<NaiveDate, TrendscanError> {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => {
            return Err(TrendscanError::InvalidInput {
                reason: format!("{} record without a date", symbol),
            });
        }
    };
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|e| TrendscanError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("invalid date '{}': {}", raw, e),
        })
}

fn to_raw_quote(symbol: &str, q: &StockQuotePayload) -> Result<RawQuote, TrendscanError> {
    Ok(RawQuote {
        symbol: symbol.to_string(),
        date: parse_vendor_date(symbol, q.date.as_deref())?,
        open: q.open.unwrap_or(0.0),
        close: q.close.unwrap_or(0.0),
        heatmap: q.heatmap.unwrap_or(0.0),
        sector_heatmap: q.sector_heatmap.unwrap_or(0.0),
        signal: Signal::from_token(q.signal.as_deref()),
        trend: Trend::from_token(q.trend.as_deref()),
        close_emas: CloseEmas {
            ema5: q.ema5.unwrap_or(0.0),
            ema10: q.ema10.unwrap_or(0.0),
            ema20: q.ema20.unwrap_or(0.0),
            ema50: q.ema50.unwrap_or(0.0),
        },
    })
}

impl QuotePort for JsonQuoteAdapter {
    fn fetch_stock(&self, symbol: &str) -> Result<StockListing, TrendscanError> {
        let payload = self.read_stock(symbol)?;
        let detail = payload.detail.as_ref();
        let sector_symbol = detail
            .and_then(|d| d.sector_symbol.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrendscanError::DataUnavailable {
                symbol: symbol.to_string(),
                reason: "payload has no sector symbol".to_string(),
            })?
            .to_string();
        let listed_symbol = detail
            .and_then(|d| d.symbol.clone())
            .unwrap_or_else(|| symbol.to_string());

        let quotes = payload
            .quotes
            .iter()
            .map(|q| to_raw_quote(&listed_symbol, q))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(StockListing {
            symbol: listed_symbol,
            sector_symbol,
            quotes,
        })
    }

    fn fetch_quotes(&self, symbol: &str) -> Result<Vec<RawQuote>, TrendscanError> {
        let payload = self.read_stock(symbol)?;
        payload
            .quotes
            .iter()
            .map(|q| to_raw_quote(symbol, q))
            .collect()
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

        let payload: BreadthPayload = parse_payload(symbol, &path, &content)?;
        let quotes = payload
            .quotes
            .unwrap_or_default()
            .iter()
            .map(|q| {
                Ok(BreadthQuote {
                    symbol: symbol.to_string(),
                    date: parse_vendor_date(symbol, q.date.as_deref())?,
                    stocks_with_buy_signal: q.bull_total.unwrap_or(0),
                    stocks_with_sell_signal: q.bear_total.unwrap_or(0),
                    stocks_in_uptrend: q.uptrend.unwrap_or(0),
                    stocks_in_neutral: q.neutral.unwrap_or(0),
                    stocks_in_downtrend: q.downtrend.unwrap_or(0),
                    bull_percentage: q.bull_per.unwrap_or(0.0),
                    ema5: q.ema5.unwrap_or(0.0),
                    ema10: q.ema10.unwrap_or(0.0),
                    ema20: q.ema20.unwrap_or(0.0),
                    ema50: q.ema50.unwrap_or(0.0),
                })
            })
            .collect::<Result<Vec<_>, TrendscanError>>()?;

        Ok(Some(quotes))
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendscanError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| TrendscanError::DataUnavailable {
            symbol: "all".to_string(),
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(symbol) = name_str.strip_suffix(".json") {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
