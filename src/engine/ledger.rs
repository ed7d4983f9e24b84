//! Ledger collaborator interface.
//!
//! Balance custody is external to the engine: the round engine only ever
//! calls `debit`/`credit` and never inspects how balances are held. The
//! in-memory implementation backs the binary and the tests; a real
//! custody service plugs in behind the same trait.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::types::GameError;

/// Opaque balance store.
pub trait Ledger: Send + Sync {
    /// Withdraw `amount` from the participant's balance.
    /// Fails with `InsufficientFunds` if the balance is below `amount`;
    /// on failure the balance is unchanged.
    fn debit(&self, participant: &str, amount: Decimal) -> Result<(), GameError>;

    /// Deposit `amount` to the participant's balance.
    fn credit(&self, participant: &str, amount: Decimal);
}

/// Simple in-memory ledger. Unknown participants hold a zero balance.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    balances: Mutex<HashMap<String, Decimal>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor seeding one participant.
    pub fn with_balance(participant: &str, amount: Decimal) -> Self {
        let ledger = Self::new();
        ledger.credit(participant, amount);
        ledger
    }

    /// Current balance, for assertions and display.
    pub fn balance(&self, participant: &str) -> Decimal {
        self.balances
            .lock()
            .unwrap()
            .get(participant)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

impl Ledger for InMemoryLedger {
    fn debit(&self, participant: &str, amount: Decimal) -> Result<(), GameError> {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(participant.to_string()).or_insert(Decimal::ZERO);
        if *balance < amount {
            return Err(GameError::InsufficientFunds);
        }
        *balance -= amount;
        debug!(participant, %amount, remaining = %balance, "Ledger debit");
        Ok(())
    }

    fn credit(&self, participant: &str, amount: Decimal) {
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(participant.to_string()).or_insert(Decimal::ZERO);
        *balance += amount;
        debug!(participant, %amount, balance = %balance, "Ledger credit");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
