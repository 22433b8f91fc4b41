//! Up/Down Paper Trading Simulator
//!
//! Reads strategy signals as JSON lines on stdin, polls Kraken for the
//! reference price and settles simulated positions.

use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use updown_paper::{
    client::{CandleInterval, KrakenClient, MarketData},
    config::Config,
    driver::{forward_feed, Driver},
    monitor::start_dashboard,
    paper::{replay_summary, CsvTradeLog, PaperEngine},
};

#[derive(Parser)]
#[command(name = "updown-paper")]
#[command(about = "Paper trading simulator for binary up/down markets")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulator (signals on stdin, prices polled from Kraken)
    Run,
    /// Show recent candles
    Candles {
        /// Interval in minutes or a label such as "5m"
        #[arg(short, long)]
        interval: Option<String>,
        /// Number of most recent candles
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show the last traded price
    Price,
    /// Summarize an existing trade log
    Summary,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Candles { interval, limit } => show_candles(config, interval, limit).await,
        Commands::Price => show_price(config).await,
        Commands::Summary => show_summary(config),
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    tracing::info!("Starting paper trading simulator");

    let market = KrakenClient::new(&config.kraken)?;
    let log = CsvTradeLog::new(&config.paper.log_path);
    tracing::info!("Trade log: {}", log.path().display());
    let engine = Arc::new(Mutex::new(PaperEngine::new(log)));

    if config.dashboard.enabled {
        let engine = engine.clone();
        let port = config.dashboard.port;
        tokio::spawn(async move {
            if let Err(e) = start_dashboard(engine, port).await {
                tracing::error!("Dashboard error: {}", e);
            }
        });
    }

    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(async move {
        let stdin = BufReader::new(tokio::io::stdin());
        if let Err(e) = forward_feed(stdin, tx).await {
            tracing::warn!("Signal feed stopped: {}", e);
        }
    });

    let driver = Driver::new(
        market,
        engine,
        config.feed.market_slug.clone(),
        Duration::from_secs(config.feed.poll_interval_secs),
    );
    driver.run(rx).await?;
    Ok(())
}

async fn show_candles(
    config: Config,
    interval: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let client = KrakenClient::new(&config.kraken)?;
    let candles = client
        .fetch_candles(interval.map(CandleInterval::from), limit)
        .await?;

    println!("\n📊 {} candles ({})\n", candles.len(), client.pair());
    println!("{:<26} {:>12} {:>12} {:>12} {:>12} {:>14}", "Open time", "Open", "High", "Low", "Close", "Volume");
    println!("{}", "-".repeat(94));
    for c in candles {
        let fmt = |v: Option<rust_decimal::Decimal>| v.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
        println!(
            "{:<26} {:>12} {:>12} {:>12} {:>12} {:>14}",
            updown_paper::paper::iso_millis(c.open_time),
            fmt(c.open),
            fmt(c.high),
            fmt(c.low),
            fmt(c.close),
            fmt(c.volume),
        );
    }
    Ok(())
}

async fn show_price(config: Config) -> anyhow::Result<()> {
    let client = KrakenClient::new(&config.kraken)?;
    match client.fetch_last_price().await? {
        Some(price) => println!("{} last: {}", client.pair(), price),
        None => println!("{} last: n/a", client.pair()),
    }
    Ok(())
}

fn show_summary(config: Config) -> anyhow::Result<()> {
    let summary = replay_summary(&config.paper.log_path)?;
    println!("\n📈 Paper Trading Summary ({})\n", config.paper.log_path.display());
    println!("Trades:        {}", summary.trades);
    println!("Wins/Losses:   {}/{}", summary.wins, summary.losses);
    println!("Win rate:      {:.1}%", summary.win_rate * rust_decimal::Decimal::ONE_HUNDRED);
    println!("Total PnL:     {}", summary.total_pnl);
    println!("Peak equity:   {}", summary.peak_equity);
    println!("Max drawdown:  {}", summary.max_drawdown);
    println!("Avg win:       {:.4}", summary.avg_win);
    println!("Avg loss:      {:.4}", summary.avg_loss);
    Ok(())
}
