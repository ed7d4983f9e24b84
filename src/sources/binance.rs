//! Binance ticker source.
//!
//! API: `https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT`
//! Auth: None required.
//! Payload: `{"symbol": "BTCUSDT", "price": "64123.45000000"}`.

use serde::Deserialize;

use super::PriceSource;

const ENDPOINT: &str = "https://api.binance.com/api/v3/ticker/price?symbol=BTCUSDT";

#[derive(Debug, Deserialize)]
struct TickerResponse {
    price: String,
}

pub struct BinanceSource;

impl PriceSource for BinanceSource {
    fn name(&self) -> &str {
        "binance"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn extract(&self, payload: &serde_json::Value) -> Option<f64> {
        let resp: TickerResponse = serde_json::from_value(payload.clone()).ok()?;
        resp.price.parse().ok()
    }
}
