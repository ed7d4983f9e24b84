//! End-to-end game flow tests.
//!
//! Drives the full stack — aggregator over a local HTTP quote server,
//! round engine with an injected clock and in-memory ledger, controller
//! ticking the lifecycle — through complete rounds.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use updown::aggregator::PriceAggregator;
use updown::analyst::{Analyst, UNAVAILABLE};
use updown::config::PriceConfig;
use updown::controller::GameController;
use updown::engine::{InMemoryLedger, Ledger, RoundEngine};
use updown::sources::PriceSource;
use updown::types::{Clock, GameError, ManualClock, PriceSample, RoundStatus, Side};

use crate::mock_source::{spawn_quote_server, TestSource, UnreachableSource};

fn price_config() -> PriceConfig {
    PriceConfig {
        source_timeout_ms: 1000,
        fallback_jitter: 50.0,
        fallback_seed_price: 64000.0,
    }
}

fn manual_clock() -> Arc<ManualClock> {
    ManualClock::at(Utc.with_ymd_and_hms(2026, 2, 17, 10, 0, 0).unwrap())
}

fn engine(clock: Arc<ManualClock>, ledger: Arc<InMemoryLedger>) -> RoundEngine {
    RoundEngine::new(
        Duration::seconds(900),
        ledger as Arc<dyn Ledger>,
        clock as Arc<dyn Clock>,
    )
    .unwrap()
}

struct OfflineAnalyst;

#[async_trait]
impl Analyst for OfflineAnalyst {
    async fn summarize(&self, _series: &[PriceSample]) -> String {
        UNAVAILABLE.to_string()
    }
    fn model_name(&self) -> &str {
        "offline"
    }
}

// ---------------------------------------------------------------------------
// Aggregator over real sockets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn aggregator_returns_exact_source_value() {
    let endpoint = spawn_quote_server(200, r#"{"price": 64500.5}"#).await;
    let sources: Vec<Arc<dyn PriceSource>> =
        vec![Arc::new(TestSource::new("good", endpoint))];
    let agg = PriceAggregator::with_sources(&price_config(), sources).unwrap();

    let sample = agg.fetch().await;
    // First success wins, value passed through untouched — no averaging.
    assert_eq!(sample.price, 64500.5);
    assert_eq!(agg.baseline(), 64500.5);
}

#[tokio::test]
async fn aggregator_skips_failing_sources() {
    let broken = spawn_quote_server(500, r#"{"error": "down"}"#).await;
    let malformed = spawn_quote_server(200, r#"{"weird": true}"#).await;
    let negative = spawn_quote_server(200, r#"{"price": -12.0}"#).await;
    let good = spawn_quote_server(200, r#"{"price": 64321.0}"#).await;

    let sources: Vec<Arc<dyn PriceSource>> = vec![
        Arc::new(UnreachableSource),
        Arc::new(TestSource::new("broken", broken)),
        Arc::new(TestSource::new("malformed", malformed)),
        Arc::new(TestSource::new("negative", negative)),
        Arc::new(TestSource::new("good", good)),
    ];
    let agg = PriceAggregator::with_sources(&price_config(), sources).unwrap();

    // Order is shuffled per call; only one source is ever valid, so every
    // fetch must land on exactly its value.
    for _ in 0..5 {
        let sample = agg.fetch().await;
        assert_eq!(sample.price, 64321.0);
    }
}

#[tokio::test]
async fn aggregator_degrades_to_walk_on_total_outage() {
    let broken = spawn_quote_server(503, r#"{}"#).await;
    let sources: Vec<Arc<dyn PriceSource>> = vec![
        Arc::new(UnreachableSource),
        Arc::new(TestSource::new("broken", broken)),
    ];
    let agg = PriceAggregator::with_sources(&price_config(), sources).unwrap();

    let sample = agg.fetch().await;
    assert!(sample.price.is_finite() && sample.price > 0.0);
    assert!((sample.price - 64000.0).abs() <= 50.0 + 1e-9);
    // The synthetic value persisted as the new baseline.
    assert_eq!(agg.baseline(), sample.price);
}

// ---------------------------------------------------------------------------
// Full round lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_round_lifecycle_up_wins() {
    let clock = manual_clock();
    let ledger = Arc::new(InMemoryLedger::with_balance("alice", dec!(5)));
    let engine = engine(clock.clone(), ledger.clone());

    // Start at price 100, alice wagers UP 1.
    let round = engine.start_round(100.0).unwrap();
    engine
        .place_wager(round.id, "alice", Side::Up, dec!(1))
        .unwrap();
    assert_eq!(ledger.balance("alice"), dec!(4));

    // Past the lock boundary the observed price is 105.
    clock.advance(Duration::seconds(900));
    let locked = engine.lock(105.0).unwrap();
    assert_eq!(locked.lock_price, Some(105.0));

    // Past the resolve boundary the observed price is 110.
    clock.advance(Duration::seconds(900));
    let ended = engine.resolve(110.0).unwrap();

    assert_eq!(ended.close_price, Some(110.0));
    assert_eq!(ended.winner, Some(Side::Up));
    assert_eq!(ended.pool, dec!(1));
    assert_eq!(engine.history().len(), 1);

    // An external payout policy can settle from the stored wagers.
    let wagers = engine.wagers_for(ended.id);
    assert_eq!(wagers.len(), 1);
    assert_eq!(wagers[0].participant, "alice");
    assert_eq!(wagers[0].side, ended.winner.unwrap());
}

#[tokio::test]
async fn broke_participant_cannot_wager() {
    let clock = manual_clock();
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = engine(clock, ledger.clone());

    let round = engine.start_round(100.0).unwrap();
    let err = engine
        .place_wager(round.id, "alice", Side::Up, dec!(1))
        .unwrap_err();

    assert_eq!(err, GameError::InsufficientFunds);
    assert_eq!(engine.current_round().unwrap().pool, Decimal::ZERO);
    assert_eq!(ledger.balance("alice"), Decimal::ZERO);
}

#[test]
fn concurrent_wagers_and_lock_stay_consistent() {
    let clock = manual_clock();
    let ledger = Arc::new(InMemoryLedger::new());
    for i in 0..16 {
        ledger.credit(&format!("p{i}"), dec!(1));
    }
    let engine = Arc::new(engine(clock, ledger.clone()));
    let round = engine.start_round(100.0).unwrap();

    // Participants race the controller's lock call. Every wager must be
    // either fully applied (debit + record + pool) or fully rejected.
    let mut handles = Vec::new();
    for i in 0..16 {
        let engine = engine.clone();
        let id = round.id;
        handles.push(std::thread::spawn(move || {
            engine.place_wager(id, &format!("p{i}"), Side::Up, dec!(1))
        }));
    }
    let locker = {
        let engine = engine.clone();
        std::thread::spawn(move || engine.lock(105.0))
    };

    let accepted = handles
        .into_iter()
        .map(|h| h.join())
        .filter(|r| matches!(r, Ok(Ok(()))))
        .count();
    locker.join().unwrap().unwrap();

    let wagers = engine.wagers_for(round.id);
    assert_eq!(wagers.len(), accepted);

    // Pool equals the sum of recorded wagers, and every accepted wager
    // was debited exactly once.
    let pool = engine.current_round().unwrap().pool;
    let total: Decimal = wagers.iter().map(|w| w.amount).sum();
    assert_eq!(pool, total);

    let debited = (0..16)
        .filter(|i| ledger.balance(&format!("p{i}")) == Decimal::ZERO)
        .count();
    assert_eq!(debited, accepted);
}

// ---------------------------------------------------------------------------
// Controller over the full stack
// ---------------------------------------------------------------------------

#[tokio::test]
async fn controller_plays_rounds_from_live_quotes() {
    let endpoint = spawn_quote_server(200, r#"{"price": 64500.0}"#).await;
    let sources: Vec<Arc<dyn PriceSource>> =
        vec![Arc::new(TestSource::new("good", endpoint))];
    let aggregator =
        Arc::new(PriceAggregator::with_sources(&price_config(), sources).unwrap());

    let clock = manual_clock();
    let ledger = Arc::new(InMemoryLedger::with_balance("alice", dec!(5)));
    let engine = Arc::new(RoundEngine::new(
        Duration::seconds(900),
        ledger as Arc<dyn Ledger>,
        clock.clone() as Arc<dyn Clock>,
    )
    .unwrap());

    let controller = GameController::new(
        aggregator,
        engine.clone(),
        Arc::new(OfflineAnalyst),
        clock.clone() as Arc<dyn Clock>,
        20,
        StdDuration::from_secs(5),
    );

    // Bootstrap tick opens the first round on the live quote.
    controller.tick().await;
    let round = engine.current_round().unwrap();
    assert_eq!(round.status, RoundStatus::Open);

    engine
        .place_wager(round.id, "alice", Side::Up, dec!(1))
        .unwrap();

    // Lock deadline passes: the tick captures the lock price.
    clock.advance(Duration::seconds(900));
    controller.tick().await;
    assert_eq!(
        engine.current_round().unwrap().lock_price,
        Some(64500.0)
    );

    // Resolve deadline passes: archived with a winner, next round open.
    clock.advance(Duration::seconds(900));
    controller.tick().await;

    let history = engine.history();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].pool, dec!(1));
    // Close equals lock here, and ties break DOWN.
    assert_eq!(history[0].winner, Some(Side::Down));
    assert_eq!(
        engine.current_round().unwrap().status,
        RoundStatus::Open
    );
}
