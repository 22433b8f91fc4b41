//! Live event loop
//!
//! Feeds strategy signals and reference-price ticks into the engine, one
//! at a time. Signals (and optional explicit ticks) arrive on a channel;
//! the driver also polls the market data source on a fixed interval and
//! turns each price into a tick for the current market.

use crate::client::MarketData;
use crate::error::Result;
use crate::monitor::SharedEngine;
use crate::paper::{Settlement, TradeLog};
use crate::types::{FeedEvent, PriceTick};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Parse one JSON line of the inbound feed. Blank or malformed lines yield `None`.
pub fn parse_feed_line(line: &str) -> Option<FeedEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Ignoring malformed feed line: {}", e);
            None
        }
    }
}

/// Forward JSON-lines events from `reader` until EOF or the receiver goes away
pub async fn forward_feed<R>(reader: R, tx: mpsc::Sender<FeedEvent>) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(event) = parse_feed_line(&line) {
            if tx.send(event).await.is_err() {
                break;
            }
        }
    }
    debug!("Feed reader finished");
    Ok(())
}

pub struct Driver<M: MarketData, L: TradeLog> {
    market: M,
    engine: SharedEngine<L>,
    /// Market the polled ticks are attributed to
    current_slug: Option<String>,
    poll_interval: Duration,
}

impl<M: MarketData, L: TradeLog> Driver<M, L> {
    pub fn new(
        market: M,
        engine: SharedEngine<L>,
        initial_slug: Option<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            market,
            engine,
            current_slug: initial_slug,
            poll_interval,
        }
    }

    pub fn current_slug(&self) -> Option<&str> {
        self.current_slug.as_deref()
    }

    /// Apply one feed event. Any slug it names becomes the current market.
    pub fn handle_event(&mut self, event: &FeedEvent) -> Option<Settlement> {
        match event {
            FeedEvent::Signal(signal) => {
                if let Some(slug) = &signal.market_slug {
                    self.current_slug = Some(slug.clone());
                }
                if let Some(pos) = self.engine.lock().on_signal(signal) {
                    debug!("Signal opened {} position", pos.side);
                }
                None
            }
            FeedEvent::Tick(tick) => {
                if let Some(slug) = &tick.market_slug {
                    self.current_slug = Some(slug.clone());
                }
                self.engine.lock().on_tick(tick)
            }
        }
    }

    /// Fetch the last price once and feed it as a tick.
    ///
    /// Data source failures are returned as-is; the caller decides whether to retry.
    pub async fn poll_once(&mut self) -> Result<Option<Settlement>> {
        let price = self.market.fetch_last_price().await?;
        let tick = PriceTick {
            market_slug: self.current_slug.clone(),
            current_price: price,
            now_ms: None,
        };
        Ok(self.engine.lock().on_tick(&tick))
    }

    /// Run until Ctrl-C. A closed feed channel leaves polling running.
    pub async fn run(mut self, mut rx: mpsc::Receiver<FeedEvent>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        let mut feed_open = true;

        info!(
            "🤖 Driver started, polling every {:?} for {}",
            self.poll_interval,
            self.current_slug.as_deref().unwrap_or("(no market yet)")
        );

        loop {
            tokio::select! {
                event = rx.recv(), if feed_open => match event {
                    Some(event) => {
                        self.handle_event(&event);
                    }
                    None => {
                        info!("Feed closed, continuing with polled prices only");
                        feed_open = false;
                    }
                },
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_once().await {
                        warn!("Price poll failed: {}", e);
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutting down");
                    break;
                }
            }
        }

        let summary = self.engine.lock().get_summary();
        info!(
            "💰 {} trades | win rate {:.1}% | PnL {} | max DD {}",
            summary.trades,
            summary.win_rate * rust_decimal::Decimal::ONE_HUNDRED,
            summary.total_pnl,
            summary.max_drawdown
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockMarketData;
    use crate::error::SimError;
    use crate::paper::{MemoryTradeLog, PaperEngine};
    use crate::types::{EntrySignal, Side, SignalAction};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn shared() -> SharedEngine<MemoryTradeLog> {
        Arc::new(Mutex::new(PaperEngine::new(MemoryTradeLog::default())))
    }

    fn enter(slug: &str, settlement_ms: Option<i64>) -> FeedEvent {
        FeedEvent::Signal(EntrySignal {
            action: SignalAction::Enter,
            side: Some(Side::Up),
            market_slug: Some(slug.to_string()),
            price_to_beat: Some(dec!(100)),
            settlement_ms,
            market_up: Some(dec!(0.4)),
            market_down: Some(dec!(0.6)),
            timestamp_ms: None,
        })
    }

    #[test]
    fn test_parse_feed_line() {
        let line = r#"{"type":"signal","action":"ENTER","side":"UP","marketSlug":"btc-1","priceToBeat":"100","marketUp":0.4}"#;
        match parse_feed_line(line) {
            Some(FeedEvent::Signal(s)) => {
                assert_eq!(s.action, SignalAction::Enter);
                assert_eq!(s.entry_price(), Some(dec!(0.4)));
                assert_eq!(s.market_down, None);
            }
            other => panic!("unexpected {:?}", other),
        }

        let tick = r#"{"type":"tick","marketSlug":"btc-2","currentPrice":101.5,"nowMs":5}"#;
        assert!(matches!(parse_feed_line(tick), Some(FeedEvent::Tick(_))));

        assert!(parse_feed_line("").is_none());
        assert!(parse_feed_line("   ").is_none());
        assert!(parse_feed_line("{not json").is_none());
        assert!(parse_feed_line(r#"{"type":"unknown"}"#).is_none());
    }

    #[tokio::test]
    async fn test_forward_feed_skips_bad_lines() {
        let input = concat!(
            r#"{"type":"signal","action":"NO_TRADE"}"#, "\n",
            "garbage\n",
            "\n",
            r#"{"type":"tick","currentPrice":"100.5"}"#, "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        forward_feed(input.as_bytes(), tx).await.unwrap();

        assert!(matches!(rx.recv().await, Some(FeedEvent::Signal(_))));
        assert!(matches!(rx.recv().await, Some(FeedEvent::Tick(_))));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_poll_settles_rolled_market() {
        let mut market = MockMarketData::new();
        market
            .expect_fetch_last_price()
            .times(1)
            .returning(|| Ok(Some(dec!(105))));

        let engine = shared();
        let mut driver = Driver::new(market, engine.clone(), None, Duration::from_secs(1));

        driver.handle_event(&enter("btc-1", None));
        assert!(engine.lock().position().is_some());

        // a signal for the next market can't open, but moves the polled slug
        driver.handle_event(&enter("btc-2", None));
        assert_eq!(driver.current_slug(), Some("btc-2"));

        let settlement = driver.poll_once().await.unwrap().unwrap();
        assert_eq!(settlement.outcome, Side::Up);
        assert_eq!(settlement.pnl, dec!(0.6));
        assert!(engine.lock().position().is_none());
    }

    #[tokio::test]
    async fn test_poll_holds_before_deadline() {
        let mut market = MockMarketData::new();
        market
            .expect_fetch_last_price()
            .returning(|| Ok(Some(dec!(99))));

        let engine = shared();
        let mut driver = Driver::new(market, engine.clone(), None, Duration::from_secs(1));
        driver.handle_event(&enter("btc-1", Some(i64::MAX)));

        assert!(driver.poll_once().await.unwrap().is_none());
        assert!(engine.lock().position().is_some());
    }

    #[tokio::test]
    async fn test_poll_error_leaves_engine_untouched() {
        let mut market = MockMarketData::new();
        market
            .expect_fetch_last_price()
            .returning(|| Err(SimError::DataSource("Kraken ticker error: 503 busy".into())));

        let engine = shared();
        let mut driver = Driver::new(market, engine.clone(), None, Duration::from_secs(1));
        driver.handle_event(&enter("btc-1", Some(0)));

        let err = driver.poll_once().await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(engine.lock().position().is_some());
        assert_eq!(engine.lock().stats().trades, 0);
    }

    #[tokio::test]
    async fn test_missing_price_is_ignored() {
        let mut market = MockMarketData::new();
        market.expect_fetch_last_price().returning(|| Ok(None));

        let engine = shared();
        let mut driver = Driver::new(market, engine.clone(), None, Duration::from_secs(1));
        driver.handle_event(&enter("btc-1", Some(0)));

        assert!(driver.poll_once().await.unwrap().is_none());
        assert!(engine.lock().position().is_some());
    }

    #[test]
    fn test_explicit_tick_settles() {
        let engine = shared();
        let mut driver = Driver::new(
            MockMarketData::new(),
            engine.clone(),
            Some("btc-1".to_string()),
            Duration::from_secs(1),
        );
        driver.handle_event(&enter("btc-1", Some(1_000)));

        let settled = driver.handle_event(&FeedEvent::Tick(PriceTick {
            market_slug: Some("btc-1".to_string()),
            current_price: Some(dec!(100)),
            now_ms: Some(1_000),
        }));
        assert_eq!(settled.unwrap().outcome, Side::Down);
        assert_eq!(engine.lock().trade_log().rows().len(), 1);
    }
}
