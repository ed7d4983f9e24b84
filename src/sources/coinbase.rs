//! Coinbase spot-price source.
//!
//! API: `https://api.coinbase.com/v2/prices/BTC-USD/spot`
//! Auth: None required.
//! Payload: `{"data": {"amount": "64123.45", ...}}` — amount is a string.

use serde::Deserialize;

use super::PriceSource;

const ENDPOINT: &str = "https://api.coinbase.com/v2/prices/BTC-USD/spot";

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: String,
}

pub struct CoinbaseSource;

impl PriceSource for CoinbaseSource {
    fn name(&self) -> &str {
        "coinbase"
    }

    fn endpoint(&self) -> &str {
        ENDPOINT
    }

    fn extract(&self, payload: &serde_json::Value) -> Option<f64> {
        let resp: SpotResponse = serde_json::from_value(payload.clone()).ok()?;
        resp.data.amount.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_spot_payload() {
        let payload = json!({"data": {"base": "BTC", "currency": "USD", "amount": "64123.45"}});
        assert_eq!(CoinbaseSource.extract(&payload), Some(64123.45));
    }

    #[test]
    fn test_extract_rejects_missing_amount() {
        let payload = json!({"data": {"base": "BTC"}});
        assert_eq!(CoinbaseSource.extract(&payload), None);
    }

    #[test]
    fn test_extract_rejects_non_numeric_amount() {
        let payload = json!({"data": {"amount": "not-a-price"}});
        assert_eq!(CoinbaseSource.extract(&payload), None);
    }
}
