/// HTTP client for the trends oracle service.
///
/// Speaks a small JSON API: one GET per query key, the run's fixed request
/// configuration passed through unchanged on every call. Transient
/// failures (network, 5xx, 429) are retried here with a linear backoff;
/// retries exhausting on a throttle signal, or an outright 403 ban,
/// escalate to `OracleError::Throttled` so the run aborts instead of
/// digging the block deeper.
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use trendrank_core::{MagnitudeProfile, Oracle, OracleError, QueryKey, RequestConfig};

/// Configuration for the trends endpoint.
pub struct TrendsClientConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub request: RequestConfig,
    pub max_retries: usize,
    pub timeout: Duration,
}

/// Wire shape of an interest-over-time response.
///
/// An absent or empty `timestamps` array is the service's "no data" answer.
#[derive(Debug, Deserialize)]
struct InterestResponse {
    #[serde(default)]
    timestamps: Vec<String>,
    #[serde(default)]
    values: BTreeMap<String, Vec<f64>>,
}

pub struct TrendsOracle {
    client: Client,
    config: TrendsClientConfig,
}

/// Clip an error body for the message, backing off to a char boundary so
/// multi-byte text never splits mid-character.
fn clip_body(body: &str) -> &str {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body;
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

impl TrendsOracle {
    pub fn new(config: TrendsClientConfig) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(TrendsOracle { client, config })
    }

    async fn send_request(
        &self,
        key: &QueryKey,
    ) -> Result<Option<MagnitudeProfile>, OracleError> {
        let url = format!(
            "{}/interest_over_time",
            self.config.endpoint.trim_end_matches('/')
        );

        let request = &self.config.request;
        let mut builder = self.client.get(&url).query(&[
            ("keywords", key.items().join(",")),
            ("timeframe", request.timeframe.clone()),
            ("cat", request.category.to_string()),
            ("gprop", request.gprop.clone()),
            ("geo", request.geo.clone()),
        ]);
        if let Some(ref api_key) = self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| OracleError::Transient(format!("HTTP request failed: {e}")))?;

        match resp.status() {
            StatusCode::FORBIDDEN => {
                // A ban, not a hiccup. Retrying makes it worse.
                let body = resp.text().await.unwrap_or_default();
                return Err(OracleError::Throttled(format!(
                    "service returned 403: {}",
                    clip_body(&body)
                )));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(OracleError::Transient("service returned 429".to_string()));
            }
            status if !status.is_success() => {
                let body = resp.text().await.unwrap_or_default();
                return Err(OracleError::Transient(format!(
                    "service returned {status}: {}",
                    clip_body(&body)
                )));
            }
            _ => {}
        }

        let data: InterestResponse = resp
            .json()
            .await
            .map_err(|e| OracleError::Transient(format!("Failed to parse response JSON: {e}")))?;

        if data.timestamps.is_empty() {
            return Ok(None);
        }

        Ok(Some(MagnitudeProfile {
            timestamps: data.timestamps,
            columns: data.values,
        }))
    }
}

#[async_trait]
impl Oracle for TrendsOracle {
    /// Fetch one profile, retrying transient failures with linear backoff.
    ///
    /// Exhausting retries on throttling escalates to `Throttled` — the
    /// distinguished signal that aborts the run.
    async fn fetch(&mut self, key: &QueryKey) -> Result<Option<MagnitudeProfile>, OracleError> {
        let mut last_err = OracleError::Transient("no attempt made".to_string());

        for attempt in 0..=self.config.max_retries {
            match self.send_request(key).await {
                Ok(profile) => return Ok(profile),
                Err(e @ OracleError::Throttled(_)) => return Err(e),
                Err(e) => {
                    debug!(%key, attempt, error = %e, "transient oracle failure");
                    last_err = e;
                    if attempt < self.config.max_retries {
                        tokio::time::sleep(Duration::from_secs(attempt as u64 + 1)).await;
                    }
                }
            }
        }

        warn!(%key, retries = self.config.max_retries, "retries exhausted");
        match last_err {
            OracleError::Transient(msg) if msg.contains("429") => Err(OracleError::Throttled(
                format!("sustained throttling after {} retries: {msg}", self.config.max_retries),
            )),
            other => Err(other),
        }
    }
}
