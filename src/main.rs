use clap::Parser;
use rsibot::config::AppConfig;
use rsibot::execution::{spawn_replay, FeedDriver, PaperExecutor};
use rsibot::persistence::{load_bars, CsvJournal, NullJournal, TradeJournal};
use rsibot::strategy::RandomExit;
use rsibot::{Engine, Result};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::time::Duration;

/// RSI threshold trading bot (paper execution)
#[derive(Debug, Parser)]
#[command(name = "rsibot", version, about)]
struct Args {
    /// CSV of `timestamp,close` bars to replay
    #[arg(long)]
    bars: Option<PathBuf>,

    /// Configuration file (defaults to ./rsibot.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the exit band draws
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between replayed bars in milliseconds
    #[arg(long)]
    pace_ms: Option<u64>,

    /// Do not write trade_log.csv / daily_summary.csv
    #[arg(long)]
    no_journal: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    let config = load_config(&args)?;
    let summary_time = config.summary_time()?;

    let Some(bars_path) = config.feed.bars.clone() else {
        return Err("No bar file given: pass --bars or set feed.bars".into());
    };
    let bars = load_bars(&bars_path)?;

    tracing::info!("🚀 RSI bot starting for {}", config.symbol);
    tracing::info!(
        "  RSI({}) long {}/{} short {}/{} exit [{}, {}] qty {}",
        config.strategy.rsi_period,
        config.strategy.long_trigger,
        config.strategy.long_entry,
        config.strategy.short_trigger,
        config.strategy.short_entry,
        config.strategy.exit_min,
        config.strategy.exit_max,
        config.quantity
    );
    tracing::info!("{:8} | {:7} | {:6} | {:8}", "Time", "Price", "RSI", "Position");

    let exit_source = match config.exit_seed {
        Some(seed) => RandomExit::seeded(seed),
        None => RandomExit::from_entropy(),
    };
    let executor = PaperExecutor::new().with_slippage_bps(config.feed.slippage_bps);
    let mut engine = Engine::new(
        config.symbol.clone(),
        config.strategy.clone(),
        config.quantity,
        executor,
        exit_source,
    )?;

    let journal: Box<dyn TradeJournal> = if config.journal.enabled {
        Box::new(CsvJournal::open(
            &config.journal.trade_log,
            &config.journal.daily_summary,
        )?)
    } else {
        Box::new(NullJournal)
    };
    let mut driver = FeedDriver::new(journal, summary_time);

    // Bars flow through a bounded channel into the single engine owner
    let (tx, mut rx) = mpsc::channel(config.feed.channel_capacity);
    let pace = (config.feed.pace_ms > 0).then(|| Duration::from_millis(config.feed.pace_ms));
    let replay_task = spawn_replay(bars, tx, pace);

    // Ctrl+C is only acted on between bars
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("⚠️  Received Ctrl+C, shutting down..."),
            Err(e) => {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await
            }
        }
    };
    driver.run_until(&mut engine, &mut rx, shutdown).await;
    replay_task.abort();

    let stats = driver.finish(&engine);
    tracing::info!("Run stats: {}", serde_json::to_string(stats)?);
    if engine.side() != rsibot::Side::Flat {
        tracing::warn!("Stopped with an open {} position", engine.side().as_str());
    }

    tracing::info!("👋 RSI bot stopped");
    Ok(())
}

fn setup_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("rsibot=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Config file and environment, then command-line overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(args.config.as_deref())?;

    if let Some(bars) = &args.bars {
        config.feed.bars = Some(bars.clone());
    }
    if let Some(seed) = args.seed {
        config.exit_seed = Some(seed);
    }
    if let Some(pace_ms) = args.pace_ms {
        config.feed.pace_ms = pace_ms;
    }
    if args.no_journal {
        config.journal.enabled = false;
    }

    Ok(config)
}
