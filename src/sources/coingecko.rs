//! CoinGecko simple-price source.
//!
//! API: `https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd`
//! Auth: None required.
//! Payload: `{"bitcoin": {"usd": 64123.45}}` — the one source quoting a
//! JSON number rather than a string.

use serde::Deserialize;

use super::PriceSource;

const ENDPOINT: &str =
    "https://api.coingecko.com/api/v3/simple/price?ids=bitcoin&vs_currencies=usd";

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: QuoteCurrencies,
}

#[derive(Debug, Deserialize)]
struct QuoteCurrencies {
    usd: f64,
}

pub struct CoinGeckoSource;

impl PriceSource for CoinGeckoSource {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn extract(&self, payload: &serde_json::Value) -> Option<f64> {
        let resp: SimplePriceResponse = serde_json::from_value(payload.clone()).ok()?;
        Some(resp.bitcoin.usd)
    }
}
