//! Market commentary integration.
//!
//! Defines the `Analyst` trait and provides the Gemini implementation.
//! Commentary is strictly best-effort: implementors degrade to a fixed
//! placeholder string on any failure and never surface an error to the
//! game loop.

pub mod gemini;

use async_trait::async_trait;

use crate::types::PriceSample;

/// Shown when the commentary backend errors or returns nothing usable.
pub const UNAVAILABLE: &str = "AI analysis currently unavailable.";

/// Shown when no API key is configured at all.
pub const UNAVAILABLE_NO_KEY: &str = "AI analyst unavailable (missing API key).";

/// Abstraction over market commentary generators.
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Summarize the recent price series into a short trend call.
    /// Infallible by contract: failures degrade to `UNAVAILABLE`.
    async fn summarize(&self, series: &[PriceSample]) -> String;

    /// Model identifier string.
    fn model_name(&self) -> &str;
}
