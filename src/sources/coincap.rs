//! CoinCap asset-info source.
//!
//! API: `https://api.coincap.io/v2/assets/bitcoin`
//! Auth: None required.
//! Payload: `{"data": {"priceUsd": "64123.4567891", ...}}` — stringly typed.

use serde::Deserialize;

use super::PriceSource;

const ENDPOINT: &str = "https://api.coincap.io/v2/assets/bitcoin";

#[derive(Debug, Deserialize)]
struct AssetResponse {
    data: AssetData,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    #[serde(rename = "priceUsd")]
    price_usd: String,
}

pub struct CoinCapSource;

impl PriceSource for CoinCapSource {
    fn name(&self) -> &str {
        "coincap"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn extract(&self, payload: &serde_json::Value) -> Option<f64> {
        let resp: AssetResponse = serde_json::from_value(payload.clone()).ok()?;
        resp.data.price_usd.parse().ok()
    }
}
