use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("Rate resolution failed: {message}")]
    RateResolutionError { message: String },

    #[error("No exchange rate available for currency {currency}")]
    MissingRateError { currency: String },

    #[error("Persisting to {store} (table '{table}') failed: {source}")]
    PersistenceError {
        store: String,
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Query '{description}' failed: {source}")]
    QueryError {
        description: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl EtlError {
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::ExtractionError {
            message: message.into(),
        }
    }

    pub fn rate_resolution(message: impl Into<String>) -> Self {
        Self::RateResolutionError {
            message: message.into(),
        }
    }

    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigError { .. }
                | Self::InvalidConfigValueError { .. }
                | Self::MissingConfigError { .. }
        )
    }

    /// Process exit code for the CLI: 2 for bad configuration, 1 for a failed run.
    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() {
            2
        } else {
            1
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) | Self::ExtractionError { .. } => {
                "Check network access to the source page and that it still contains the bank table"
            }
            Self::RateResolutionError { .. } | Self::MissingRateError { .. } => {
                "Check that the exchange rate CSV is reachable and lists GBP, EUR and INR"
            }
            Self::ProcessingError { .. } => "Check the shape of the scraped table or query result",
            Self::IoError(_) | Self::CsvError(_) => {
                "Check that the output and log paths are writable"
            }
            Self::PersistenceError { .. } | Self::QueryError { .. } => {
                "Check that the database file is writable and not locked by another process"
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the command line options or TOML file",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
