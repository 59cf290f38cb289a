//! Match report port.

use crate::domain::error::TrendscanError;
use crate::domain::scan::ScanOutcome;
use std::path::Path;

/// Port for persisting the matches of a scan.
pub trait ReportPort {
    fn write(
        &self,
        outcome: &ScanOutcome,
        strategy_name: &str,
        output_path: &Path,
    ) -> Result<(), TrendscanError>;
}
