//! Domain error types.

/// Top-level error type for trendscan.
#[derive(Debug, thiserror::Error)]
pub enum TrendscanError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("no breadth series found for {symbol}")]
    MissingSeries { symbol: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendscanError {
    /// True for failures that exclude a single stock from a scan rather than
    /// aborting the whole run.
    pub fn is_data_condition(&self) -> bool {
        matches!(
            self,
            TrendscanError::MissingSeries { .. } | TrendscanError::DataUnavailable { .. }
        )
    }
}

impl From<&TrendscanError> for std::process::ExitCode {
    fn from(err: &TrendscanError) -> Self {
        let code: u8 = match err {
            TrendscanError::Io(_) => 1,
            TrendscanError::ConfigParse { .. }
            | TrendscanError::ConfigMissing { .. }
            | TrendscanError::ConfigInvalid { .. } => 2,
            TrendscanError::DataUnavailable { .. } => 3,
            TrendscanError::InvalidInput { .. } => 4,
            TrendscanError::MissingSeries { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
