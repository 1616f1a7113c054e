use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::rate::{HistoryQuery, LatestRates, PairKey, RateHistory};
use crate::models::settings::{Settings, DEFAULT_API_BASE_URL};
use super::traits::RatesBackend;

/// reqwest-backed client for the rates REST API.
///
/// - **Endpoints**: `/rates/latest`, `/rates/history`, `/rates/fetch-now`,
///   `/rates/pairs/{base}/{target}`
/// - **Errors**: transport failures → `Network`, any non-2xx → `Server`
///   (status + body), undecodable 2xx bodies → `Deserialization`.
/// - No retries; the caller decides when to try again.
pub struct HttpRatesBackend {
    client: Client,
    base_url: String,
}

impl HttpRatesBackend {
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, 30)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, CoreError> {
        settings.validate()?;
        Ok(Self::with_timeout(&settings.api_base_url, settings.request_timeout_secs))
    }

    #[cfg_attr(target_arch = "wasm32", allow(unused_variables))]
    fn with_timeout(base_url: &str, timeout_secs: u64) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(timeout_secs));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── URL builders ────────────────────────────────────────────────

    pub fn latest_url(&self) -> String {
        format!("{}/rates/latest", self.base_url)
    }

    pub fn history_url(&self, query: &HistoryQuery) -> String {
        format!(
            "{}/rates/history?base={}&target={}&start={}&end={}",
            self.base_url,
            query.pair.base,
            query.pair.target,
            query.start_param(),
            query.end_param()
        )
    }

    pub fn fetch_now_url(&self) -> String {
        format!("{}/rates/fetch-now", self.base_url)
    }

    pub fn delete_pair_url(&self, pair: &PairKey) -> String {
        format!("{}/rates/pairs/{}/{}", self.base_url, pair.base, pair.target)
    }

    // ── Internal HTTP helpers ───────────────────────────────────────

    /// Send a request and turn any non-2xx status into `CoreError::Server`.
    async fn send(&self, request: RequestBuilder) -> Result<Response, CoreError> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(CoreError::Server {
            status: status.as_u16(),
            body,
        })
    }

    /// Read a mutation acknowledgement. Only its optional `message` is used.
    ///
    /// The status already reported success, so an unreadable or unparsable
    /// body is logged and the mutation still counts as done.
    async fn read_ack(&self, resp: Response, action: &str) -> Result<(), CoreError> {
        let text = match resp.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    backend = self.name(),
                    action,
                    error = %CoreError::from(e),
                    "mutation acknowledged; body unreadable"
                );
                return Ok(());
            }
        };
        match serde_json::from_str::<Ack>(&text) {
            Ok(Ack { message: Some(message) }) => {
                tracing::info!(backend = self.name(), action, %message, "mutation acknowledged");
            }
            _ => tracing::info!(backend = self.name(), action, "mutation acknowledged"),
        }
        Ok(())
    }
}

impl Default for HttpRatesBackend {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

// ── Acknowledgement body of fetch-now / delete ──────────────────────

#[derive(Deserialize)]
struct Ack {
    #[serde(default)]
    message: Option<String>,
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RatesBackend for HttpRatesBackend {
    fn name(&self) -> &str {
        "HttpRatesBackend"
    }

    async fn latest_rates(&self) -> Result<LatestRates, CoreError> {
        let url = self.latest_url();
        tracing::debug!(%url, "GET latest rates");

        let resp = self.send(self.client.get(&url)).await?;
        resp.json::<LatestRates>().await.map_err(|e| {
            CoreError::Deserialization(format!("Failed to parse latest rates: {e}"))
        })
    }

    async fn history(&self, query: &HistoryQuery) -> Result<RateHistory, CoreError> {
        let url = self.history_url(query);
        tracing::debug!(pair = %query.pair, start = %query.start, end = %query.end, "GET history");

        let resp = self.send(self.client.get(&url)).await?;
        resp.json::<RateHistory>().await.map_err(|e| {
            CoreError::Deserialization(format!(
                "Failed to parse history for {} ({}..{}): {e}",
                query.pair, query.start, query.end
            ))
        })
    }

    async fn fetch_now(&self) -> Result<(), CoreError> {
        let url = self.fetch_now_url();
        tracing::debug!(%url, "POST fetch-now");

        let resp = self.send(self.client.post(&url)).await?;
        self.read_ack(resp, "fetch-now").await
    }

    async fn delete_pair(&self, pair: &PairKey) -> Result<(), CoreError> {
        let url = self.delete_pair_url(pair);
        tracing::debug!(%pair, "DELETE pair");

        let resp = self.send(self.client.delete(&url)).await?;
        self.read_ack(resp, "delete-pair").await
    }
}
