//! Configuration validation.
//!
//! Checks every scan-related key before any data is loaded.

use crate::domain::enricher::MissingSeriesPolicy;
use crate::domain::error::TrendscanError;
use crate::domain::scan::parse_symbols;
use crate::domain::strategy::strategy_by_name;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `symbols_required` is false when the caller supplies symbols itself.
pub fn validate_scan_config(
    config: &dyn ConfigPort,
    symbols_required: bool,
) -> Result<(), TrendscanError> {
    validate_base_path(config)?;
    validate_format(config)?;
    validate_symbols(config, symbols_required)?;
    validate_non_empty_if_set(config, "scan", "benchmark")?;
    validate_non_empty_if_set(config, "scan", "full_market_symbol")?;
    validate_strategy(config)?;
    validate_window(config)?;
    validate_missing_breadth(config)?;
    Ok(())
}

fn validate_base_path(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    match config.get_string("data", "base_path") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(TrendscanError::ConfigMissing {
            section: "data".to_string(),
            key: "base_path".to_string(),
        }),
    }
}

fn validate_format(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    match config.get_string("data", "format") {
        None => Ok(()),
        Some(s) if matches!(s.trim().to_lowercase().as_str(), "csv" | "json") => Ok(()),
        Some(s) => Err(TrendscanError::ConfigInvalid {
            section: "data".to_string(),
            key: "format".to_string(),
            reason: format!("unsupported format '{}', expected csv or json", s),
        }),
    }
}

fn validate_symbols(config: &dyn ConfigPort, required: bool) -> Result<(), TrendscanError> {
    match config.get_string("scan", "symbols") {
        None if required => Err(TrendscanError::ConfigMissing {
            section: "scan".to_string(),
            key: "symbols".to_string(),
        }),
        None => Ok(()),
        Some(s) => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| TrendscanError::ConfigInvalid {
                section: "scan".to_string(),
                key: "symbols".to_string(),
                reason: e.to_string(),
            }),
    }
}

fn validate_non_empty_if_set(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), TrendscanError> {
    match config.get_string(section, key) {
        Some(s) if s.trim().is_empty() => Err(TrendscanError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must not be empty", key),
        }),
        _ => Ok(()),
    }
}

fn validate_strategy(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    if let Some(name) = config.get_string("scan", "strategy") {
        strategy_by_name(&name).map_err(|_| TrendscanError::ConfigInvalid {
            section: "scan".to_string(),
            key: "strategy".to_string(),
            reason: format!("unknown strategy '{}'", name.trim()),
        })?;
    }
    Ok(())
}

fn validate_window(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(TrendscanError::ConfigInvalid {
                section: "scan".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_missing_breadth(config: &dyn ConfigPort) -> Result<(), TrendscanError> {
    parse_missing_breadth(config).map(|_| ())
}

/// Parse an optional `[scan]` date key.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TrendscanError> {
    match config.get_string("scan", key) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| TrendscanError::ConfigInvalid {
                section: "scan".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

pub fn parse_missing_breadth(config: &dyn ConfigPort) -> Result<MissingSeriesPolicy, TrendscanError> {
    match config.get_string("scan", "missing_breadth") {
        None => Ok(MissingSeriesPolicy::default()),
        Some(s) => MissingSeriesPolicy::parse(&s).ok_or_else(|| TrendscanError::ConfigInvalid {
            section: "scan".to_string(),
            key: "missing_breadth".to_string(),
            reason: format!(
                "unknown policy '{}', expected fail or assume-not-in-uptrend",
                s.trim()
            ),
        }),
    }
}
