//! Error types for the simulator

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    /// Non-success status or provider-level error list from the market data source
    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trade log error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for SimError {
    fn from(e: config::ConfigError) -> Self {
        SimError::Config(e.to_string())
    }
}

impl SimError {
    /// Whether the error came from the upstream exchange rather than local I/O
    pub fn is_data_source(&self) -> bool {
        matches!(self, SimError::DataSource(_) | SimError::Http(_))
    }
}
