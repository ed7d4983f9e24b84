//! Persistence layer.
//!
//! Saves and loads the archived round history to/from a JSON file.
//! The in-memory archive stays authoritative; this snapshot exists so a
//! restarted process can show past rounds, with no durability guarantee.
//! The store is swappable — nothing outside this module knows the format.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::types::Round;

/// Default snapshot file path.
const DEFAULT_STATE_FILE: &str = "updown_state.json";

/// Serialized game snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Finished rounds, most recent first.
    pub rounds: Vec<Round>,
    pub saved_at: DateTime<Utc>,
}

/// Save the archived rounds to a JSON file.
pub fn save_snapshot(rounds: &[Round], path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    let snapshot = GameSnapshot {
        rounds: rounds.to_vec(),
        saved_at: Utc::now(),
    };
    let json = serde_json::to_string_pretty(&snapshot)
        .context("Failed to serialise game snapshot")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write snapshot to {path}"))?;

    debug!(path, rounds = snapshot.rounds.len(), "Snapshot saved");
    Ok(())
}

/// Load a snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<GameSnapshot>> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read snapshot from {path}"))?;

    let snapshot: GameSnapshot = serde_json::from_str(&json)
        .context(format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        rounds = snapshot.rounds.len(),
        saved_at = %snapshot.saved_at,
        "Snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
