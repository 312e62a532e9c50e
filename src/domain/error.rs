//! Domain error types.

/// Top-level error type for folioval.
#[derive(Debug, thiserror::Error)]
pub enum FoliovalError {
    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("store query error: {reason}")]
    StoreQuery { reason: String },

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

    #[error("invalid transaction: {reason}")]
    InvalidTransaction { reason: String },

    #[error("unknown range token: {token}")]
    UnknownRange { token: String },

    #[error("unknown resolution code: {token}")]
    UnknownResolution { token: String },

    #[error("unparsable instant: {input}")]
    InvalidInstant { input: String },

    #[error("invalid window: end {end} precedes start {start}")]
    InvalidWindow {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    #[error("unknown instrument: {symbol}")]
    UnknownInstrument { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FoliovalError> for std::process::ExitCode {
    fn from(err: &FoliovalError) -> Self {
        let code: u8 = match err {
            FoliovalError::Io(_) => 1,
            FoliovalError::ConfigParse { .. }
            | FoliovalError::ConfigMissing { .. }
            | FoliovalError::ConfigInvalid { .. } => 2,
            FoliovalError::Store { .. } | FoliovalError::StoreQuery { .. } => 3,
            FoliovalError::InvalidTransaction { .. }
            | FoliovalError::UnknownRange { .. }
            | FoliovalError::UnknownResolution { .. }
            | FoliovalError::InvalidInstant { .. }
            | FoliovalError::InvalidWindow { .. } => 4,
            FoliovalError::UnknownInstrument { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
