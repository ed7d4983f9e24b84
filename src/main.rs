//! UPDOWN — Binary Price Prediction Game Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores round history from disk (or starts fresh), and runs the
//! tick loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use updown::aggregator::PriceAggregator;
use updown::analyst::gemini::GeminiClient;
use updown::config::AppConfig;
use updown::controller::GameController;
use updown::engine::{InMemoryLedger, Ledger, RoundEngine};
use updown::storage;
use updown::types::{Clock, SystemClock};

const BANNER: &str = r#"
 _   _ ____  ____   _____        ___   _
| | | |  _ \|  _ \ / _ \ \      / / \ | |
| | | | |_) | | | | | | \ \ /\ / /|  \| |
| |_| |  __/| |_| | |_| |\ V  V / | |\  |
 \___/|_|   |____/ \___/  \_/\_/  |_| \_|

  Binary Price Prediction Game Engine
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging();

    // Print startup banner
    println!("{BANNER}");
    info!(
        asset = %cfg.game.asset,
        round_duration_secs = cfg.game.round_duration_secs,
        tick_interval_secs = cfg.game.tick_interval_secs,
        "UPDOWN starting up"
    );

    // -- Initialise components -------------------------------------------

    let aggregator = Arc::new(PriceAggregator::new(&cfg.price)?);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let ledger = Arc::new(InMemoryLedger::new());

    let engine = Arc::new(RoundEngine::new(
        chrono::Duration::seconds(cfg.game.round_duration_secs as i64),
        ledger.clone() as Arc<dyn Ledger>,
        clock.clone(),
    )?);

    // Restore archived rounds from the last run, if any.
    match storage::load_snapshot(Some(cfg.storage.state_file.as_str())) {
        Ok(Some(snapshot)) => engine.restore_archive(snapshot.rounds),
        Ok(None) => info!("Fresh start"),
        Err(e) => warn!(error = %e, "Ignoring unreadable snapshot"),
    }

    // Commentary is best-effort: without a key the client degrades to a
    // fixed placeholder instead of calling out.
    let api_key = if cfg.analyst.enabled {
        std::env::var(&cfg.analyst.api_key_env).ok()
    } else {
        None
    };
    if api_key.is_none() {
        warn!("No analyst API key configured — commentary will be unavailable");
    }
    let analyst = Arc::new(GeminiClient::new(
        api_key,
        Some(cfg.analyst.model.clone()),
        Some(cfg.analyst.max_tokens),
    )?);

    let controller = GameController::new(
        aggregator,
        engine.clone(),
        analyst,
        clock,
        cfg.game.history_capacity,
        Duration::from_secs(cfg.game.tick_interval_secs),
    );

    // -- Main loop -------------------------------------------------------

    info!("Entering game loop. Press Ctrl+C to stop.");
    controller
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
        })
        .await;

    // Save archived rounds on the way out.
    let history = engine.history();
    storage::save_snapshot(&history, Some(cfg.storage.state_file.as_str()))?;
    info!(
        rounds_played = history.len(),
        "UPDOWN shut down cleanly."
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("updown=info"));

    let json_logging = std::env::var("UPDOWN_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
