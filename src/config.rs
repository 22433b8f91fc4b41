//! Configuration management
//!
//! Loads an optional TOML file, then overlays `UPDOWN__SECTION__KEY`
//! environment variables (a `.env` file is read first if present).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub kraken: KrakenConfig,
    #[serde(default)]
    pub paper: PaperConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Market data source
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KrakenConfig {
    #[serde(default = "default_kraken_url")]
    pub base_url: String,
    #[serde(default = "default_pair")]
    pub pair: String,
    /// Candle granularity used when a requested interval can't be parsed
    #[serde(default = "default_candle_window")]
    pub candle_window_minutes: u32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for KrakenConfig {
    fn default() -> Self {
        Self {
            base_url: default_kraken_url(),
            pair: default_pair(),
            candle_window_minutes: default_candle_window(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaperConfig {
    /// CSV file receiving one row per settled trade
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Market slug attached to polled ticks until a signal names one
    #[serde(default)]
    pub market_slug: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            market_slug: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_dashboard_port")]
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_dashboard_port(),
        }
    }
}

fn default_kraken_url() -> String {
    "https://api.kraken.com".to_string()
}

fn default_pair() -> String {
    "XBTUSD".to_string()
}

fn default_candle_window() -> u32 {
    15
}

fn default_timeout() -> u64 {
    30
}

fn default_log_path() -> PathBuf {
    PathBuf::from("./logs/paper_trades.csv")
}

fn default_poll_interval() -> u64 {
    5
}

fn default_dashboard_port() -> u16 {
    8080
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("UPDOWN")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        use crate::error::SimError;

        if self.kraken.pair.trim().is_empty() {
            return Err(SimError::Config("kraken.pair must not be empty".into()));
        }
        if self.kraken.candle_window_minutes == 0 {
            return Err(SimError::Config(
                "kraken.candle_window_minutes must be positive".into(),
            ));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(SimError::Config("feed.poll_interval_secs must be positive".into()));
        }
        Ok(())
    }
}
