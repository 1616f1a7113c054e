use std::collections::{HashMap, HashSet};

use super::rate::{HistoryQuery, LatestRates, RateHistory};

/// Identity of a cached backend response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// `GET /rates/latest`: a single fixed entry.
    LatestRates,
    /// `GET /rates/history`: one entry per `(base, target, start, end)`.
    History(HistoryQuery),
}

/// Invalidation group. A cached entry may belong to several; a mutation
/// names the groups it invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    /// Latest-rate rows; invalidated by fetch-now and pair deletion.
    Rates,
}

/// A successful backend response held by the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedResponse {
    Latest(LatestRates),
    History(RateHistory),
}

/// Session-local cache of query responses.
///
/// - Entries are only ever inserted whole or removed; an insert under an
///   existing key replaces it.
/// - Nothing expires on its own. An entry goes away when one of its tags is
///   invalidated, or when the caller clears the cache.
/// - Each tag has its own epoch, bumped when the tag is invalidated, and
///   `clear` bumps a generation shared by every key. A response started
///   before one of those bumps can be recognised as stale when it lands.
///   Untagged keys only see the generation.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: HashMap<QueryKey, CachedResponse>,
    tags: HashMap<CacheTag, HashSet<QueryKey>>,
    tag_epochs: HashMap<CacheTag, u64>,
    generation: u64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&CachedResponse> {
        self.entries.get(key)
    }

    pub fn get_latest(&self) -> Option<&LatestRates> {
        match self.entries.get(&QueryKey::LatestRates)? {
            CachedResponse::Latest(latest) => Some(latest),
            CachedResponse::History(_) => None,
        }
    }

    pub fn get_history(&self, query: &HistoryQuery) -> Option<&RateHistory> {
        match self.entries.get(&QueryKey::History(query.clone()))? {
            CachedResponse::History(history) => Some(history),
            CachedResponse::Latest(_) => None,
        }
    }

    /// Store a response under `key`, replacing any previous one, and register
    /// it with each of `tags`.
    pub fn insert(&mut self, key: QueryKey, response: CachedResponse, tags: &[CacheTag]) {
        for tag in tags {
            self.tags.entry(*tag).or_default().insert(key.clone());
        }
        self.entries.insert(key, response);
    }

    /// Drop every entry registered with `tag`.
    /// Returns the number of entries removed.
    pub fn invalidate(&mut self, tag: CacheTag) -> usize {
        *self.tag_epochs.entry(tag).or_default() += 1;
        let Some(keys) = self.tags.remove(&tag) else {
            return 0;
        };
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(&key).is_some() {
                removed += 1;
            }
        }
        // Keys may still be listed under other tags.
        let entries = &self.entries;
        for members in self.tags.values_mut() {
            members.retain(|k| entries.contains_key(k));
        }
        removed
    }

    /// Invalidation epoch seen by an entry registered with `tags`.
    ///
    /// Only grows, and changes exactly when `clear` runs or one of `tags`
    /// is invalidated.
    pub fn epoch(&self, tags: &[CacheTag]) -> u64 {
        tags.iter()
            .map(|tag| self.tag_epochs.get(tag).copied().unwrap_or_default())
            .fold(self.generation, u64::wrapping_add)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all cached data.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.tags.clear();
        self.generation += 1;
    }
}
