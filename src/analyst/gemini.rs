//! Gemini commentary client.
//!
//! Implements the `Analyst` trait against the Gemini `generateContent`
//! endpoint. Handles prompt construction, response parsing, and retry
//! with exponential backoff. Per the commentary contract, every failure
//! path collapses to a fixed placeholder string.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Analyst, UNAVAILABLE, UNAVAILABLE_NO_KEY};
use crate::types::PriceSample;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_MAX_TOKENS: u32 = 256;

/// Maximum retries on transient errors.
const MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff (ms).
const BASE_BACKOFF_MS: u64 = 500;

// ---------------------------------------------------------------------------
// API types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct GeminiClient {
    http: Client,
    /// `None` means no key configured: summarize short-circuits to the
    /// no-key placeholder without touching the network.
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("UPDOWN/0.1.0")
            .build()
            .context("Failed to build Gemini HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    /// Build the analyst prompt from the recent series.
    fn build_prompt(series: &[PriceSample]) -> String {
        let points = series
            .iter()
            .map(|p| format!("{}: ${:.2}", p.at.format("%H:%M"), p.price))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "Act as a crypto market analyst. Here are the last few BTC price \
             points (15 min interval context):\n{points}\n\n\
             Predict the trend for the next 15 minutes. \
             Be concise (max 20 words). \
             Format: \"Trend: [Bullish/Bearish/Neutral]. [Reasoning].\""
        )
    }

    /// Send a generateContent request with retry + backoff.
    async fn call_api(&self, api_key: &str, prompt: &str) -> Result<String> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_tokens,
            },
        };

        let mut last_error = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = BASE_BACKOFF_MS * 2u64.pow(attempt - 1);
                debug!(attempt, delay_ms = delay, "Retrying Gemini API call");
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }

            let resp = self
                .http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&request)
                .send()
                .await;

            match resp {
                Ok(resp) if resp.status().is_success() => {
                    let body: GenerateResponse =
                        resp.json().await.context("Failed to parse Gemini response")?;
                    return Self::first_text(body);
                }
                Ok(resp) => {
                    let status = resp.status();
                    last_error = Some(anyhow::anyhow!("Gemini API error: {status}"));
                    // Client errors other than rate limiting won't heal on retry.
                    if status.is_client_error() && status.as_u16() != 429 {
                        break;
                    }
                }
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e).context("Gemini request failed"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Gemini call failed")))
    }

    fn first_text(body: GenerateResponse) -> Result<String> {
        let text = body
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .next();
        match text {
            Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
            _ => bail!("Gemini response contained no text"),
        }
    }
}

#[async_trait]
impl Analyst for GeminiClient {
    async fn summarize(&self, series: &[PriceSample]) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            return UNAVAILABLE_NO_KEY.to_string();
        };
        if series.is_empty() {
            return UNAVAILABLE.to_string();
        }

        let prompt = Self::build_prompt(series);
        match self.call_api(api_key, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Analyst call failed, degrading to placeholder");
                UNAVAILABLE.to_string()
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
