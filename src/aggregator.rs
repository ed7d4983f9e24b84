//! Multi-source price resolver.
//!
//! Produces exactly one vetted `PriceSample` per call despite any subset
//! of upstream sources being slow, down, or returning malformed data.
//! Source order is shuffled per call to spread load and avoid hammering
//! one endpoint into a rate limit; the first valid quote wins and later
//! sources are not consulted that cycle. If every source fails the
//! aggregator degrades to a bounded random walk from the last known
//! baseline — the game must keep advancing, so this component has no
//! externally visible failure mode.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PriceConfig;
use crate::sources::{builtin_sources, PriceSource};
use crate::types::PriceSample;

/// Floor for synthetic quotes so a long outage can never walk the
/// baseline to zero or below.
const MIN_SYNTHETIC_PRICE: f64 = 0.01;

pub struct PriceAggregator {
    http: Client,
    sources: Vec<Arc<dyn PriceSource>>,
    /// Last known-good price, real or synthetic. Single-writer: updated
    /// only under this mutex so overlapping fetches never lose a write.
    baseline: Mutex<f64>,
    timeout: Duration,
    jitter: f64,
}

impl PriceAggregator {
    /// Aggregator over the four built-in reference sources.
    pub fn new(cfg: &PriceConfig) -> Result<Self> {
        Self::with_sources(cfg, builtin_sources())
    }

    /// Aggregator over a caller-supplied source set. Any descriptor
    /// meeting the `PriceSource` contract is accepted.
    pub fn with_sources(cfg: &PriceConfig, sources: Vec<Arc<dyn PriceSource>>) -> Result<Self> {
        let timeout = Duration::from_millis(cfg.source_timeout_ms);
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("UPDOWN/0.1.0")
            .build()
            .context("Failed to build price HTTP client")?;

        Ok(Self {
            http,
            sources,
            baseline: Mutex::new(cfg.fallback_seed_price),
            timeout,
            jitter: cfg.fallback_jitter,
        })
    }

    /// Fetch one authoritative price sample.
    ///
    /// Never errors and never suspends past `timeout × source count`:
    /// each source carries its own hard deadline, and total provider
    /// outage returns a synthetic sample instead of raising.
    pub async fn fetch(&self) -> PriceSample {
        let mut order: Vec<usize> = (0..self.sources.len()).collect();
        {
            let mut rng = rand::thread_rng();
            order.shuffle(&mut rng);
        }

        for idx in order {
            let source = &self.sources[idx];
            match tokio::time::timeout(self.timeout, self.query(source.as_ref())).await {
                Ok(Ok(price)) => {
                    // Sync the fallback walk to the real market.
                    *self.baseline.lock().unwrap() = price;
                    debug!(source = source.name(), price, "Quote accepted");
                    return PriceSample { at: Utc::now(), price };
                }
                Ok(Err(e)) => {
                    debug!(source = source.name(), error = %e, "Source failed, trying next");
                }
                Err(_) => {
                    debug!(source = source.name(), "Source deadline exceeded, trying next");
                }
            }
        }

        warn!("All price sources failed — using fallback simulation");
        PriceSample {
            at: Utc::now(),
            price: self.synthesize(),
        }
    }

    /// The current fallback baseline (last accepted or synthesized price).
    pub fn baseline(&self) -> f64 {
        *self.baseline.lock().unwrap()
    }

    /// Query a single source and vet the extracted value.
    async fn query(&self, source: &dyn PriceSource) -> Result<f64> {
        let resp = self
            .http
            .get(source.endpoint())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .context("request failed")?;

        if !resp.status().is_success() {
            bail!("HTTP {}", resp.status());
        }

        let payload: serde_json::Value = resp.json().await.context("invalid JSON body")?;
        let price = source
            .extract(&payload)
            .context("payload shape mismatch")?;

        if !(price.is_finite() && price > 0.0) {
            bail!("extracted price out of range: {price}");
        }
        Ok(price)
    }

    /// Advance the baseline by a uniform perturbation within ±jitter and
    /// return it. The synthesized value persists so consecutive fallbacks
    /// walk continuously instead of resetting.
    fn synthesize(&self) -> f64 {
        let change = {
            let mut rng = rand::thread_rng();
            rng.gen_range(-self.jitter..=self.jitter)
        };
        let mut baseline = self.baseline.lock().unwrap();
        *baseline = (*baseline + change).max(MIN_SYNTHETIC_PRICE);
        *baseline
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
