use chrono::NaiveDate;
use futures::future::{FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::CoreError;
use crate::models::cache::{CacheTag, CachedResponse, QueryCache, QueryKey};
use crate::models::rate::{HistoryQuery, LatestRates, PairKey, RateHistory};
use crate::providers::traits::RatesBackend;

#[cfg(not(target_arch = "wasm32"))]
type FetchFuture = futures::future::BoxFuture<'static, Result<CachedResponse, CoreError>>;
#[cfg(target_arch = "wasm32")]
type FetchFuture = futures::future::LocalBoxFuture<'static, Result<CachedResponse, CoreError>>;

/// A backend request that several callers may be waiting on.
struct InFlight {
    id: u64,
    /// Cache epoch of the key's tags when the request started.
    epoch: u64,
    future: Shared<FetchFuture>,
}

#[derive(Default)]
struct ClientState {
    cache: QueryCache,
    in_flight: HashMap<QueryKey, InFlight>,
    next_request_id: u64,
}

/// Caching front of a [`RatesBackend`].
///
/// Cache strategy:
/// - **Latest rates**: one fixed entry, tagged `Rates`. Kept until a
///   successful mutation (fetch-now, delete) invalidates the tag.
/// - **History**: one entry per `(base, target, start, end)`. Never expires;
///   a repeated query with the same key is served from cache.
/// - **Failures** are returned to the caller and never cached.
/// - Identical queries issued while one is already in flight join it instead
///   of hitting the backend again. Queries for different keys run
///   independently.
/// - A response whose request started before an invalidation of one of its
///   own tags (or a `clear_cache`) is handed to its callers but not stored.
///   History responses are untagged, so a mutation never discards them.
///
/// Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct RateCacheClient {
    backend: Arc<dyn RatesBackend>,
    state: Arc<Mutex<ClientState>>,
}

impl RateCacheClient {
    pub fn new(backend: Arc<dyn RatesBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ClientState::default())),
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Latest rate of every tracked pair.
    pub async fn latest_rates(&self) -> Result<LatestRates, CoreError> {
        match self.query(QueryKey::LatestRates, &[CacheTag::Rates]).await? {
            CachedResponse::Latest(latest) => Ok(latest),
            CachedResponse::History(_) => Err(mismatched(&QueryKey::LatestRates)),
        }
    }

    /// History of `base/target` between two calendar dates (inclusive).
    /// Codes and the date order are validated before anything is sent.
    pub async fn history(
        &self,
        base: &str,
        target: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RateHistory, CoreError> {
        let query = HistoryQuery::new(PairKey::parse(base, target)?, start, end)?;
        self.history_for(&query).await
    }

    /// History for an already validated query.
    pub async fn history_for(&self, query: &HistoryQuery) -> Result<RateHistory, CoreError> {
        let key = QueryKey::History(query.clone());
        match self.query(key.clone(), &[]).await? {
            CachedResponse::History(history) => Ok(history),
            CachedResponse::Latest(_) => Err(mismatched(&key)),
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Ask the server to pull fresh upstream rates.
    /// On success the latest-rates entry is invalidated.
    pub async fn fetch_now(&self) -> Result<(), CoreError> {
        self.backend.fetch_now().await.inspect_err(|e| {
            tracing::warn!(backend = self.backend.name(), error = %e, "fetch-now failed");
        })?;
        self.invalidate(CacheTag::Rates);
        Ok(())
    }

    /// Delete `base/target` and its whole history on the server.
    pub async fn delete_pair(&self, base: &str, target: &str) -> Result<(), CoreError> {
        let pair = PairKey::parse(base, target)?;
        self.delete(&pair).await
    }

    /// Delete an already validated pair.
    /// On success the latest-rates entry is invalidated; on failure nothing changes.
    pub async fn delete(&self, pair: &PairKey) -> Result<(), CoreError> {
        self.backend.delete_pair(pair).await.inspect_err(|e| {
            tracing::warn!(backend = self.backend.name(), %pair, error = %e, "delete failed");
        })?;
        self.invalidate(CacheTag::Rates);
        Ok(())
    }

    // ── Cache inspection ────────────────────────────────────────────

    /// Drop every cached entry of `tag`. Returns the number removed.
    pub fn invalidate(&self, tag: CacheTag) -> usize {
        let removed = self.lock().cache.invalidate(tag);
        tracing::info!(?tag, removed, "cache invalidated");
        removed
    }

    #[must_use]
    pub fn cached_latest(&self) -> Option<LatestRates> {
        self.lock().cache.get_latest().cloned()
    }

    #[must_use]
    pub fn cached_history(&self, query: &HistoryQuery) -> Option<RateHistory> {
        self.lock().cache.get_history(query).cloned()
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.lock().cache.len()
    }

    /// Number of distinct requests currently waiting on the backend.
    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.lock().in_flight.len()
    }

    pub fn clear_cache(&self) {
        self.lock().cache.clear();
    }

    // ── Internal ────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Serve `key` from cache, join an identical in-flight request, or start
    /// a new one. The guard is never held across an await.
    async fn query(
        &self,
        key: QueryKey,
        tags: &[CacheTag],
    ) -> Result<CachedResponse, CoreError> {
        let (id, epoch, future) = {
            let mut state = self.lock();

            if let Some(hit) = state.cache.get(&key) {
                tracing::debug!(?key, "cache hit");
                return Ok(hit.clone());
            }

            if let Some(pending) = state.in_flight.get(&key) {
                tracing::debug!(?key, "joining in-flight request");
                (pending.id, pending.epoch, pending.future.clone())
            } else {
                tracing::debug!(?key, "cache miss");
                let id = state.next_request_id;
                state.next_request_id += 1;
                let epoch = state.cache.epoch(tags);
                let future = self.request(key.clone()).shared();
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        id,
                        epoch,
                        future: future.clone(),
                    },
                );
                (id, epoch, future)
            }
        };

        let result = future.await;

        // The first waiter to get here retires the request; the rest find it gone.
        let mut state = self.lock();
        if state.in_flight.get(&key).is_some_and(|p| p.id == id) {
            state.in_flight.remove(&key);
            match &result {
                Ok(response) if state.cache.epoch(tags) == epoch => {
                    state.cache.insert(key, response.clone(), tags);
                }
                Ok(_) => tracing::debug!(?key, "response outlived an invalidation; not cached"),
                Err(e) => tracing::debug!(?key, error = %e, "request failed; not cached"),
            }
        }
        result
    }

    fn request(&self, key: QueryKey) -> FetchFuture {
        let backend = Arc::clone(&self.backend);
        boxed(async move {
            match key {
                QueryKey::LatestRates => backend.latest_rates().await.map(CachedResponse::Latest),
                QueryKey::History(query) => {
                    backend.history(&query).await.map(CachedResponse::History)
                }
            }
        })
    }
}

impl std::fmt::Debug for RateCacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("RateCacheClient")
            .field("backend", &self.backend.name())
            .field("cached", &state.cache.len())
            .field("in_flight", &state.in_flight.len())
            .finish()
    }
}

fn mismatched(key: &QueryKey) -> CoreError {
    CoreError::Deserialization(format!("Cached response does not match query {key:?}"))
}

#[cfg(not(target_arch = "wasm32"))]
fn boxed<F>(future: F) -> FetchFuture
where
    F: Future<Output = Result<CachedResponse, CoreError>> + Send + 'static,
{
    future.boxed()
}

#[cfg(target_arch = "wasm32")]
fn boxed<F>(future: F) -> FetchFuture
where
    F: Future<Output = Result<CachedResponse, CoreError>> + 'static,
{
    future.boxed_local()
}
