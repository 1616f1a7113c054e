use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::rate::{HistoryQuery, LatestRates, PairKey, RateHistory};

/// Abstraction over the rates REST API.
///
/// `HttpRatesBackend` talks to the real service; tests plug in their own
/// implementations. Each method is one endpoint and does no caching.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait RatesBackend: Send + Sync {
    /// Human-readable name of this backend (for logs/errors).
    fn name(&self) -> &str;

    /// `GET /rates/latest`: the newest sample of every tracked pair.
    async fn latest_rates(&self) -> Result<LatestRates, CoreError>;

    /// `GET /rates/history`: all samples of one pair between two dates.
    async fn history(&self, query: &HistoryQuery) -> Result<RateHistory, CoreError>;

    /// `POST /rates/fetch-now`: ask the server to pull fresh upstream rates.
    async fn fetch_now(&self) -> Result<(), CoreError>;

    /// `DELETE /rates/pairs/{base}/{target}`: remove a pair and its history.
    async fn delete_pair(&self, pair: &PairKey) -> Result<(), CoreError>;
}
