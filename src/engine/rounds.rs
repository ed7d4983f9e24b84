//! Round state machine.
//!
//! A round moves OPEN → LOCKED → ENDED, never backwards. The engine
//! enforces the hard invariants of the game: a wager is never accepted
//! after the lock boundary, the lock price is fixed exactly once, and a
//! round is never double-resolved.
//!
//! All mutable state lives behind one mutex, so every check-then-mutate
//! sequence (e.g. "round still open, apply wager") is atomic with respect
//! to a concurrent `lock()` arriving from the ticking controller. The
//! engine holds no timers: an external driver compares the clock against
//! the stored deadlines and invokes `lock`/`resolve` explicitly.

use anyhow::{ensure, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::engine::ledger::Ledger;
use crate::types::{Clock, GameError, Round, RoundStatus, Side, Wager};

struct EngineState {
    /// At most one active (OPEN or LOCKED) round at a time.
    current: Option<Round>,
    /// Finished rounds, most recent first.
    archive: Vec<Round>,
    /// Wagers keyed by round id, then participant.
    wagers: HashMap<u64, HashMap<String, Wager>>,
    /// Highest round id handed out, for the non-decreasing guarantee.
    last_id: u64,
}

pub struct RoundEngine {
    clock: Arc<dyn Clock>,
    ledger: Arc<dyn Ledger>,
    /// Duration D: rounds lock at `opened_at + D`, resolve at
    /// `opened_at + 2D`.
    round_duration: Duration,
    /// Archive cap; `None` keeps every finished round.
    archive_cap: Option<usize>,
    inner: Mutex<EngineState>,
}

impl RoundEngine {
    pub fn new(
        round_duration: Duration,
        ledger: Arc<dyn Ledger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        ensure!(
            round_duration > Duration::zero(),
            "round duration must be positive"
        );
        Ok(Self {
            clock,
            ledger,
            round_duration,
            archive_cap: None,
            inner: Mutex::new(EngineState {
                current: None,
                archive: Vec::new(),
                wagers: HashMap::new(),
                last_id: 0,
            }),
        })
    }

    /// Cap the archive length. Oldest finished rounds are dropped first.
    pub fn with_archive_cap(mut self, cap: usize) -> Self {
        self.archive_cap = Some(cap);
        self
    }

    /// Open a new round at the given price.
    ///
    /// Fails with `InvalidState` if a round is already active — the game
    /// runs at most one round at a time, and resolution must archive the
    /// previous round before the next one opens.
    pub fn start_round(&self, open_price: f64) -> Result<Round, GameError> {
        let now = self.clock.now();
        let mut state = self.inner.lock().unwrap();

        if state.current.is_some() {
            return Err(GameError::InvalidState("a round is already active"));
        }

        // Id derives from creation time; clamp so two rounds opened within
        // the same second still produce a non-decreasing sequence.
        let id = (now.timestamp().max(0) as u64).max(state.last_id + 1);
        state.last_id = id;

        let round = Round {
            id,
            opened_at: now,
            locks_at: now + self.round_duration,
            resolves_at: now + self.round_duration * 2,
            lock_price: None,
            close_price: None,
            pool: Decimal::ZERO,
            status: RoundStatus::Open,
            winner: None,
        };

        info!(
            round = id,
            open_price,
            locks_at = %round.locks_at,
            "Round opened"
        );
        state.current = Some(round.clone());
        Ok(round)
    }

    /// Accept a wager on the current round.
    ///
    /// This is the only mutation path for the pool and the wager index.
    /// The debit and the wager record are applied inside one critical
    /// section: a concurrent `lock()` either sees the wager fully applied
    /// or rejects it, never a debit without a recorded wager.
    pub fn place_wager(
        &self,
        round_id: u64,
        participant: &str,
        side: Side,
        amount: Decimal,
    ) -> Result<(), GameError> {
        if amount <= Decimal::ZERO {
            return Err(GameError::InvalidState("wager amount must be positive"));
        }

        let now = self.clock.now();
        let mut state = self.inner.lock().unwrap();

        let round = match &state.current {
            Some(r) if r.id == round_id => r,
            // Unknown or archived round: not open for wagers.
            _ => return Err(GameError::RoundNotOpen),
        };

        // Lock boundary is checked by timestamp, not only by cached
        // status: a wager arriving after `locks_at` is rejected even if
        // the scheduler hasn't advanced the status yet.
        if round.status != RoundStatus::Open || now >= round.locks_at {
            return Err(GameError::RoundNotOpen);
        }

        if state
            .wagers
            .get(&round_id)
            .is_some_and(|by_participant| by_participant.contains_key(participant))
        {
            return Err(GameError::DuplicateWager);
        }

        // Balance check and withdrawal happen in the ledger; a failed
        // debit leaves pool and wager index untouched.
        self.ledger.debit(participant, amount)?;

        let round = state.current.as_mut().unwrap();
        round.pool += amount;
        let pool = round.pool;
        state.wagers.entry(round_id).or_default().insert(
            participant.to_string(),
            Wager {
                round_id,
                participant: participant.to_string(),
                side,
                amount,
                placed_at: now,
            },
        );

        info!(round = round_id, participant, %side, %amount, %pool, "Wager accepted");
        Ok(())
    }

    /// Fix the lock price and close the wagering window.
    ///
    /// Callable only while OPEN. A second call is a no-op error
    /// (`AlreadyLocked`) and never overwrites the existing lock price.
    pub fn lock(&self, observed_price: f64) -> Result<Round, GameError> {
        let mut state = self.inner.lock().unwrap();

        let round = state
            .current
            .as_mut()
            .ok_or(GameError::InvalidState("no active round to lock"))?;

        match round.status {
            RoundStatus::Open => {}
            RoundStatus::Locked => return Err(GameError::AlreadyLocked),
            RoundStatus::Ended => return Err(GameError::InvalidState("round already ended")),
        }

        round.lock_price = Some(observed_price);
        round.status = RoundStatus::Locked;
        info!(round = round.id, lock_price = observed_price, pool = %round.pool, "Round locked");
        Ok(round.clone())
    }

    /// Resolve the current round against the observed price and archive it.
    ///
    /// Winner is UP iff the close is strictly above the lock; a tie
    /// resolves DOWN ("not strictly greater implies DOWN"). The engine
    /// does not auto-chain: the driver calls `start_round` afterwards,
    /// keeping the transition observable.
    pub fn resolve(&self, observed_price: f64) -> Result<Round, GameError> {
        let mut state = self.inner.lock().unwrap();

        let round = state
            .current
            .as_ref()
            .ok_or(GameError::InvalidState("no active round to resolve"))?;
        if round.status != RoundStatus::Locked {
            return Err(GameError::InvalidState("round is not locked"));
        }

        let mut round = state.current.take().unwrap();
        // lock_price is always set once status is Locked.
        let lock_price = round.lock_price.unwrap_or(observed_price);
        let winner = if observed_price > lock_price {
            Side::Up
        } else {
            Side::Down
        };

        round.close_price = Some(observed_price);
        round.winner = Some(winner);
        round.status = RoundStatus::Ended;

        info!(
            round = round.id,
            lock_price,
            close_price = observed_price,
            %winner,
            pool = %round.pool,
            "Round resolved"
        );

        state.archive.insert(0, round.clone());
        if let Some(cap) = self.archive_cap {
            state.archive.truncate(cap);
        }
        Ok(round)
    }

    /// The active round, if any.
    pub fn current_round(&self) -> Option<Round> {
        self.inner.lock().unwrap().current.clone()
    }

    /// Finished rounds, most recent first.
    pub fn history(&self) -> Vec<Round> {
        self.inner.lock().unwrap().archive.clone()
    }

    /// Stored wagers for a round, for an external payout policy to settle
    /// from archived rounds. Settlement itself is not the engine's job.
    pub fn wagers_for(&self, round_id: u64) -> Vec<Wager> {
        self.inner
            .lock()
            .unwrap()
            .wagers
            .get(&round_id)
            .map(|by_participant| by_participant.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Restore previously archived rounds (e.g. from a saved snapshot).
    /// Only ENDED rounds are accepted; the newest-first order is kept.
    pub fn restore_archive(&self, rounds: Vec<Round>) {
        let mut state = self.inner.lock().unwrap();
        let restored: Vec<Round> = rounds
            .into_iter()
            .filter(|r| r.status == RoundStatus::Ended)
            .collect();
        if let Some(last) = restored.first() {
            state.last_id = state.last_id.max(last.id);
        }
        debug!(count = restored.len(), "Archive restored");
        state.archive = restored;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
