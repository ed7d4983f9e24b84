//! Shared types for the UPDOWN engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that source, engine, and
//! controller modules can depend on them without circular references.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Price samples
// ---------------------------------------------------------------------------

/// A single authoritative price observation. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub at: DateTime<Utc>,
    /// Always a finite, strictly positive value — enforced at the
    /// aggregator boundary before a sample is ever constructed.
    pub price: f64,
}

impl fmt::Display for PriceSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ${:.2}", self.at.format("%H:%M"), self.price)
    }
}

// ---------------------------------------------------------------------------
// Wager side
// ---------------------------------------------------------------------------

/// Direction of a wager: close price above or below the lock price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Up,
    Down,
}

impl Side {
    /// The opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Up => Side::Down,
            Side::Down => Side::Up,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Up => write!(f, "UP"),
            Side::Down => write!(f, "DOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Round
// ---------------------------------------------------------------------------

/// Round lifecycle status. Progression is monotonic: OPEN → LOCKED → ENDED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    Open,
    Locked,
    Ended,
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStatus::Open => write!(f, "OPEN"),
            RoundStatus::Locked => write!(f, "LOCKED"),
            RoundStatus::Ended => write!(f, "ENDED"),
        }
    }
}

/// One instance of the prediction game.
///
/// `lock_price` is set exactly once at the OPEN → LOCKED transition and
/// `close_price` exactly once at resolution; neither is ever overwritten.
/// Once archived (status ENDED) a round is immutable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    /// Derived from creation time; non-decreasing across rounds.
    pub id: u64,
    pub opened_at: DateTime<Utc>,
    pub locks_at: DateTime<Utc>,
    pub resolves_at: DateTime<Utc>,
    /// Reference price captured when wagering closes. `None` while OPEN.
    pub lock_price: Option<f64>,
    /// Price observed at resolution. `None` until ENDED.
    pub close_price: Option<f64>,
    /// Cumulative wagered amount. Frozen once the round locks.
    pub pool: Decimal,
    pub status: RoundStatus,
    /// Winning side, set at resolution. Close strictly above lock → UP,
    /// otherwise DOWN (ties break DOWN).
    pub winner: Option<Side>,
}

impl Round {
    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Open
    }

    /// Time remaining until the wagering window closes.
    pub fn time_to_lock(&self, now: DateTime<Utc>) -> Duration {
        self.locks_at - now
    }

    /// Helper to build a test round with sensible defaults.
    #[cfg(test)]
    pub fn sample(now: DateTime<Utc>) -> Self {
        Round {
            id: now.timestamp() as u64,
            opened_at: now,
            locks_at: now + Duration::seconds(900),
            resolves_at: now + Duration::seconds(1800),
            lock_price: None,
            close_price: None,
            pool: Decimal::ZERO,
            status: RoundStatus::Open,
            winner: None,
        }
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "round #{} [{}] pool {} lock {:?} close {:?}",
            self.id, self.status, self.pool, self.lock_price, self.close_price
        )
    }
}

// ---------------------------------------------------------------------------
// Wager
// ---------------------------------------------------------------------------

/// A participant's single stake on UP or DOWN for one round.
/// At most one wager per participant per round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wager {
    pub round_id: u64,
    pub participant: String,
    pub side: Side,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Caller-correctable errors surfaced by the round engine.
///
/// None of these are fatal: every variant is a rejection of a single
/// operation, and engine state stays consistent afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Operation attempted in the wrong round status.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The target round is not accepting wagers (wrong round, wrong
    /// status, or the lock boundary has already passed).
    #[error("round is not open for wagers")]
    RoundNotOpen,

    /// `lock` called on a round whose lock price is already fixed.
    #[error("round is already locked")]
    AlreadyLocked,

    /// The participant already holds a wager on this round.
    #[error("participant already wagered on this round")]
    DuplicateWager,

    /// Ledger balance below the wagered amount.
    #[error("insufficient funds")]
    InsufficientFunds,
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Time source injected into the engine and controller so tests can
/// drive transitions with synthetic timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used by the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock advanced manually from the outside. Lets tests drive lock and
/// resolve boundaries deterministically instead of sleeping.
pub struct ManualClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(start: DateTime<Utc>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            now: std::sync::Mutex::new(start),
        })
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
