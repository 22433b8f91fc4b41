//! Kraken public REST client
//!
//! Fetches OHLC candles and the last traded price for a single pair and
//! normalizes them into [`Candle`] / `Option<Decimal>`.

use super::MarketData;
use crate::config::KrakenConfig;
use crate::error::{Result, SimError};
use crate::types::Candle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Key Kraken adds next to the pair data in OHLC results
const RESERVED_RESULT_KEY: &str = "last";

/// Requested candle granularity: raw minutes or a label such as `"5m"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandleInterval {
    Minutes(u32),
    Label(String),
}

impl From<u32> for CandleInterval {
    fn from(minutes: u32) -> Self {
        CandleInterval::Minutes(minutes)
    }
}

impl From<&str> for CandleInterval {
    fn from(label: &str) -> Self {
        CandleInterval::Label(label.to_string())
    }
}

impl From<String> for CandleInterval {
    fn from(label: String) -> Self {
        CandleInterval::Label(label)
    }
}

/// Resolve an interval to whole minutes.
///
/// Labels yield their first run of digits. Zero is treated as unparsable.
pub fn parse_interval_minutes(interval: &CandleInterval) -> Option<u32> {
    let minutes = match interval {
        CandleInterval::Minutes(m) => *m,
        CandleInterval::Label(label) => {
            let digits: String = label
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().ok()?
        }
    };
    (minutes > 0).then_some(minutes)
}

/// Locate the data key in a Kraken `result` object, ignoring the reserved `last` key
pub fn pick_result_key(result: &Value) -> Option<&str> {
    result
        .as_object()?
        .keys()
        .find(|k| k.as_str() != RESERVED_RESULT_KEY)
        .map(String::as_str)
}

/// Numeric JSON value or numeric string as a decimal
pub fn to_number(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Decimal::from)
            .or_else(|| n.as_f64().and_then(Decimal::from_f64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<Decimal>()
                .ok()
                .or_else(|| Decimal::from_scientific(s).ok())
        }
        _ => None,
    }
}

fn to_epoch_secs(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .and_then(|f| f.trunc().to_i64())
        }),
        Value::String(s) => s
            .trim()
            .parse()
            .ok()
            .or_else(|| to_number(value)?.trunc().to_i64()),
        _ => None,
    }
}

/// Start time (epoch seconds) that asks for roughly the last `limit` candles.
/// Never earlier than the epoch.
pub fn since_secs(now_secs: i64, limit: usize, interval_minutes: u32) -> i64 {
    let window = i64::try_from(limit)
        .unwrap_or(i64::MAX)
        .saturating_mul(i64::from(interval_minutes) * 60);
    now_secs.saturating_sub(window).max(0)
}

fn parse_candle_row(row: &Value, span_secs: i64) -> Option<Candle> {
    let fields = row.as_array()?;
    let field = |i: usize| fields.get(i).and_then(to_number);
    let open_secs = to_epoch_secs(fields.first()?)?;

    let open_time = open_secs.checked_mul(1000)?;
    let close_time = open_secs.checked_add(span_secs)?.checked_mul(1000)?;
    DateTime::<Utc>::from_timestamp_millis(close_time)?;

    Some(Candle {
        open_time,
        open: field(1),
        high: field(2),
        low: field(3),
        close: field(4),
        volume: field(6),
        close_time,
    })
}

/// Normalize raw OHLC rows, keeping only the last `limit` readable rows when given.
///
/// Row layout is `[time, open, high, low, close, vwap, volume, count]`.
/// Rows without a readable, in-range open time are dropped before the
/// limit is applied.
pub fn normalize_candles(
    rows: &[Value],
    interval_minutes: u32,
    limit: Option<usize>,
) -> impl Iterator<Item = Candle> {
    let span_secs = i64::from(interval_minutes) * 60;
    let candles: Vec<Candle> = rows
        .iter()
        .filter_map(|row| parse_candle_row(row, span_secs))
        .collect();
    let skip = limit
        .map(|n| candles.len().saturating_sub(n))
        .unwrap_or(0);

    candles.into_iter().skip(skip)
}

#[derive(Debug, Deserialize)]
struct KrakenResponse {
    #[serde(default)]
    error: Vec<String>,
    #[serde(default)]
    result: Value,
}

/// Kraken public API client
#[derive(Clone)]
pub struct KrakenClient {
    http: Client,
    base_url: String,
    pair: String,
    default_interval: u32,
}

impl KrakenClient {
    /// Create a new Kraken client
    pub fn new(config: &KrakenConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            pair: config.pair.clone(),
            default_interval: config.candle_window_minutes,
        })
    }

    pub fn pair(&self) -> &str {
        &self.pair
    }

    /// GET a public endpoint and unwrap Kraken's `{error, result}` envelope
    async fn get_result(&self, path: &str, query: &[(&str, String)], label: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let resp = self.http.get(&url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SimError::DataSource(format!(
                "Kraken {} error: {} {}",
                label,
                status.as_u16(),
                body
            )));
        }

        let payload: KrakenResponse = resp.json().await?;
        if !payload.error.is_empty() {
            return Err(SimError::DataSource(format!(
                "Kraken {} error: {}",
                label,
                payload.error.join(", ")
            )));
        }

        Ok(payload.result)
    }
}

#[async_trait]
impl MarketData for KrakenClient {
    async fn fetch_candles(
        &self,
        interval: Option<CandleInterval>,
        limit: Option<usize>,
    ) -> Result<Vec<Candle>> {
        let interval_minutes = interval
            .as_ref()
            .and_then(parse_interval_minutes)
            .unwrap_or(self.default_interval);
        let limit = limit.filter(|&n| n > 0);

        let mut query = vec![
            ("pair", self.pair.clone()),
            ("interval", interval_minutes.to_string()),
        ];
        if let Some(n) = limit {
            let since = since_secs(Utc::now().timestamp(), n, interval_minutes);
            query.push(("since", since.to_string()));
        }

        let result = self.get_result("/0/public/OHLC", &query, "OHLC").await?;
        let rows = pick_result_key(&result)
            .and_then(|key| result.get(key))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let candles: Vec<Candle> = normalize_candles(rows, interval_minutes, limit).collect();
        debug!(
            "Fetched {} {}m candles for {}",
            candles.len(),
            interval_minutes,
            self.pair
        );
        Ok(candles)
    }

    async fn fetch_last_price(&self) -> Result<Option<Decimal>> {
        let query = [("pair", self.pair.clone())];
        let result = self.get_result("/0/public/Ticker", &query, "ticker").await?;

        let price = pick_result_key(&result)
            .and_then(|key| result.get(key))
            .and_then(|ticker| ticker.get("c"))
            .and_then(|c| c.get(0))
            .and_then(to_number);
        Ok(price)
    }
}
