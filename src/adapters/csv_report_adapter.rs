//! CSV match report adapter.

use crate::domain::error::TrendscanError;
use crate::domain::scan::ScanOutcome;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct MatchRow<'a> {
    symbol: &'a str,
    date: String,
    close: f64,
    heatmap: f64,
    sector_heatmap: f64,
    last_buy_signal: String,
}

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn csv_error(path: &Path, e: csv::Error) -> TrendscanError {
    TrendscanError::Io(std::io::Error::other(format!(
        "failed to write report {}: {}",
        path.display(),
        e
    )))
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        outcome: &ScanOutcome,
        strategy_name: &str,
        output_path: &Path,
    ) -> Result<(), TrendscanError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(output_path)
            .map_err(|e| csv_error(output_path, e))?;

        // Header is written even when nothing matched
        writer
            .write_record([
                "symbol",
                "date",
                "close",
                "heatmap",
                "sector_heatmap",
                "last_buy_signal",
            ])
            .map_err(|e| csv_error(output_path, e))?;

        for quote in outcome.matches() {
            let row = MatchRow {
                symbol: &quote.symbol,
                date: quote.date.to_string(),
                close: quote.close,
                heatmap: quote.heatmap,
                sector_heatmap: quote.sector_heatmap,
                last_buy_signal: quote
                    .last_buy_signal
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            };
            writer.serialize(&row).map_err(|e| csv_error(output_path, e))?;
        }
        writer.flush()?;

        info!(
            path = %output_path.display(),
            strategy = strategy_name,
            rows = outcome.match_count(),
            "report written"
        );
        Ok(())
    }
}
