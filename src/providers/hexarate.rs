use crate::core::clock::{Clock, SystemClock};
use crate::core::context::Context;
use crate::core::currency::{CurrencyCode, FetchedRate, RatePair, RateSource};
use crate::core::error::RateError;
use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

pub const DEFAULT_BASE_URL: &str = "https://hexarate.paikama.co/api/rates";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on how much of a response body is read.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Fetches mid rates from a Hexarate compatible API.
pub struct HexarateSource {
    base_url: String,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HexarateSource {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_clock(base_url, timeout, Arc::new(SystemClock))
    }

    pub fn with_clock(
        base_url: &str,
        timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("ledgerfx/1.0")
            .timeout(timeout)
            .build()?;

        Ok(HexarateSource {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            clock,
        })
    }

    async fn request(&self, pair: &RatePair) -> Result<FetchedRate, RateError> {
        let url = format!("{}/{}/{}/latest", self.base_url, pair.from, pair.to);
        debug!("Requesting exchange rate from {}", url);

        let network_error = |e: reqwest::Error| RateError::Network {
            pair: pair.clone(),
            message: e.to_string(),
        };

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(url = %url, error = %e, "Rate request failed");
            network_error(e)
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            // The status alone decides the error; an unreadable body is left empty.
            let body = read_body(response).await.unwrap_or_default();
            error!(
                url = %url,
                status_code = status.as_u16(),
                body = %body,
                "Rate source returned non-OK status"
            );
            return Err(RateError::Upstream {
                pair: pair.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let text = read_body(response).await.map_err(network_error)?;

        let data: HexarateResponse = serde_json::from_str(&text).map_err(|e| {
            error!(url = %url, error = %e, "Failed to decode rate response");
            RateError::Decode {
                pair: pair.clone(),
                message: e.to_string(),
            }
        })?;

        let rate = parse_mid(&data.data.mid).ok_or_else(|| RateError::Decode {
            pair: pair.clone(),
            message: format!("mid rate '{}' is not a decimal number", data.data.mid),
        })?;

        let fetched = FetchedRate {
            rate,
            fetched_at: self.clock.now(),
            as_of: data.data.date,
        };
        info!(
            from = %pair.from,
            to = %pair.to,
            rate = %fetched.rate,
            date = fetched.as_of.as_deref().unwrap_or("unknown"),
            "Fetched exchange rate"
        );
        Ok(fetched)
    }
}

#[derive(Debug, Deserialize)]
struct HexarateResponse {
    data: HexarateData,
}

#[derive(Debug, Deserialize)]
struct HexarateData {
    mid: serde_json::Number,
    #[serde(default)]
    date: Option<String>,
}

/// Reads at most [`MAX_BODY_BYTES`] of the response body.
async fn read_body(mut response: reqwest::Response) -> Result<String, reqwest::Error> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let remaining = MAX_BODY_BYTES - body.len();
        if chunk.len() >= remaining {
            body.extend_from_slice(&chunk[..remaining]);
            break;
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Reads the JSON number through its shortest text form, so `0.92` stays
/// exactly `0.92` instead of picking up binary float noise.
fn parse_mid(mid: &serde_json::Number) -> Option<Decimal> {
    let text = mid.to_string();
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

#[async_trait]
impl RateSource for HexarateSource {
    #[instrument(
        name = "HexarateFetch",
        skip(self, ctx),
        fields(from = %from, to = %to)
    )]
    async fn fetch(
        &self,
        ctx: &Context,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<FetchedRate, RateError> {
        if from.is_empty() || to.is_empty() {
            error!(from = %from, to = %to, "Empty currency codes");
            return Err(RateError::InvalidInput(
                "currency codes must not be empty".to_string(),
            ));
        }

        let pair = RatePair::new(from.clone(), to.clone());
        tokio::select! {
            biased;
            _ = ctx.done() => {
                debug!(pair = %pair, "Rate request cancelled");
                Err(RateError::Cancelled { pair: pair.clone() })
            }
            result = self.request(&pair) => result,
        }
    }
}
