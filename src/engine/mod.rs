//! Round lifecycle engine.
//!
//! Owns round state, timing transitions, wager acceptance, lock/resolve
//! logic, and the archive of finished rounds. Driven externally — the
//! engine holds no timers of its own.

pub mod ledger;
pub mod rounds;

pub use ledger::{InMemoryLedger, Ledger};
pub use rounds::RoundEngine;
