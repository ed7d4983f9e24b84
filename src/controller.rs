//! Game loop driver.
//!
//! Ticks on a fixed interval: fetch one vetted price, append it to the
//! bounded history, and advance the round lifecycle when the stored
//! deadlines have passed. The controller owns all timing; the engine
//! only ever sees explicit `lock`/`resolve` calls with observed prices.
//!
//! Ticks never overlap: the run loop awaits each tick before asking the
//! interval for the next one, and missed ticks are skipped rather than
//! queued, so at most one lock/resolve sequence is ever in flight.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::aggregator::PriceAggregator;
use crate::analyst::Analyst;
use crate::engine::RoundEngine;
use crate::history::PriceHistory;
use crate::types::{Clock, PriceSample, RoundStatus};

pub struct GameController {
    aggregator: Arc<PriceAggregator>,
    engine: Arc<RoundEngine>,
    analyst: Arc<dyn Analyst>,
    clock: Arc<dyn Clock>,
    history: Mutex<PriceHistory>,
    tick_interval: Duration,
}

impl GameController {
    pub fn new(
        aggregator: Arc<PriceAggregator>,
        engine: Arc<RoundEngine>,
        analyst: Arc<dyn Analyst>,
        clock: Arc<dyn Clock>,
        history_capacity: usize,
        tick_interval: Duration,
    ) -> Self {
        Self {
            aggregator,
            engine,
            analyst,
            clock,
            history: Mutex::new(PriceHistory::new(history_capacity)),
            tick_interval,
        }
    }

    /// Snapshot of the recent price series, oldest first.
    pub fn series(&self) -> Vec<PriceSample> {
        self.history.lock().unwrap().as_series()
    }

    /// One full cycle: fetch → record → advance lifecycle.
    /// Returns the sample observed this tick.
    pub async fn tick(&self) -> PriceSample {
        let sample = self.aggregator.fetch().await;
        self.history.lock().unwrap().append(sample);
        self.advance_lifecycle(sample.price).await;
        sample
    }

    /// Compare the clock against the current round's deadlines and fire
    /// the due transitions. A round that slept past both deadlines locks
    /// and resolves within the same tick.
    async fn advance_lifecycle(&self, latest_price: f64) {
        let now = self.clock.now();

        let Some(round) = self.engine.current_round() else {
            // Bootstrap: first tick after a fresh start opens the game.
            if let Err(e) = self.engine.start_round(latest_price) {
                warn!(error = %e, "Failed to open initial round");
            }
            return;
        };

        if round.status == RoundStatus::Open && now >= round.locks_at {
            match self.engine.lock(latest_price) {
                Ok(locked) => debug!(round = locked.id, lock_price = latest_price, "Lock deadline hit"),
                // Lost the race to another tick; nothing to do.
                Err(e) => debug!(error = %e, "Lock skipped"),
            }
        }

        let Some(round) = self.engine.current_round() else {
            return;
        };
        if round.status == RoundStatus::Locked && now >= round.resolves_at {
            match self.engine.resolve(latest_price) {
                Ok(ended) => {
                    info!(
                        round = ended.id,
                        winner = %ended.winner.map(|w| w.to_string()).unwrap_or_default(),
                        pool = %ended.pool,
                        "Round resolved by scheduler"
                    );
                    let commentary = self.analyst.summarize(&self.series()).await;
                    info!(round = ended.id, commentary = %commentary, "Analyst view");

                    if let Err(e) = self.engine.start_round(latest_price) {
                        warn!(error = %e, "Failed to open next round");
                    }
                }
                Err(e) => debug!(error = %e, "Resolve skipped"),
            }
        }
    }

    /// Drive ticks until the shutdown signal resolves.
    ///
    /// The interval skips missed ticks (queue of depth one), and the
    /// loop awaits each tick to completion, so a slow tick delays but
    /// never overlaps the next.
    pub async fn run(&self, shutdown: impl std::future::Future<Output = ()>) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            interval_secs = self.tick_interval.as_secs(),
            "Game loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let sample = self.tick().await;
                    debug!(price = sample.price, "Tick complete");
                }
                _ = &mut shutdown => {
                    info!("Shutdown signal received, stopping game loop");
                    break;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
