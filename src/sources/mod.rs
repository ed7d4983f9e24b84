//! Upstream price sources.
//!
//! Defines the `PriceSource` trait and provides descriptors for the four
//! reference quote endpoints:
//! - Coinbase — spot-price shaped payload
//! - CoinCap — asset-info shaped payload
//! - Binance — ticker shaped payload
//! - CoinGecko — simple-price shaped payload
//!
//! A source is a pure descriptor: the aggregator owns the HTTP client,
//! the deadline, and the validity check. Any type meeting this contract
//! can be substituted for (or added alongside) the built-ins.

pub mod binance;
pub mod coinbase;
pub mod coincap;
pub mod coingecko;

use std::sync::Arc;

/// Descriptor for one external price-quoting endpoint.
pub trait PriceSource: Send + Sync {
    /// Source name for logging and identification.
    fn name(&self) -> &str;

    /// Full GET URL returning a JSON payload.
    fn endpoint(&self) -> &str;

    /// Pull the quote out of the raw payload. `None` on any shape
    /// mismatch — the aggregator treats that as a failed source.
    fn extract(&self, payload: &serde_json::Value) -> Option<f64>;
}

/// The default source set, in declaration order. The aggregator shuffles
/// per call, so this order carries no priority.
pub fn builtin_sources() -> Vec<Arc<dyn PriceSource>> {
    vec![
        Arc::new(coinbase::CoinbaseSource),
        Arc::new(coincap::CoinCapSource),
        Arc::new(binance::BinanceSource),
        Arc::new(coingecko::CoinGeckoSource),
    ]
}
