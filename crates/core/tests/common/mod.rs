// ═══════════════════════════════════════════════════════════════════
// Shared test helpers — sample builders and a scriptable mock backend
// ═══════════════════════════════════════════════════════════════════

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use rate_watch_core::errors::CoreError;
use rate_watch_core::models::rate::{
    CurrencyCode, HistoryPoint, HistoryQuery, LatestRates, PairKey, RateHistory, RateSample,
};
use rate_watch_core::providers::traits::RatesBackend;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

pub fn ts(y: i32, m: u32, day: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, h, min, 0).unwrap()
}

pub fn code(s: &str) -> CurrencyCode {
    CurrencyCode::parse(s).unwrap()
}

pub fn pair(base: &str, target: &str) -> PairKey {
    PairKey::parse(base, target).unwrap()
}

pub fn sample(base: &str, target: &str, rate: f64, timestamp: DateTime<Utc>) -> RateSample {
    RateSample {
        base: code(base),
        target: code(target),
        rate,
        timestamp,
    }
}

/// Latest-rate rows for the given pairs, in order.
pub fn latest(pairs: &[(&str, &str, f64)]) -> LatestRates {
    let rates: Vec<RateSample> = pairs
        .iter()
        .map(|(b, t, r)| sample(b, t, *r, ts(2024, 1, 2, 10, 0)))
        .collect();
    LatestRates {
        count: rates.len(),
        rates,
        message: None,
    }
}

/// Backend double that records calls and can be told to fail or stall.
///
/// - `latest_rates` returns the current row list; `delete_pair` removes the
///   pair from it, as the real server does.
/// - `history` returns `history_points` for whatever pair is asked.
pub struct MockBackend {
    pub rows: Mutex<LatestRates>,
    pub history_points: Vec<HistoryPoint>,
    pub delay: Option<Duration>,

    pub fail_latest: AtomicBool,
    pub fail_history: AtomicBool,
    pub fail_fetch: AtomicBool,
    pub fail_delete: AtomicBool,

    pub latest_calls: AtomicUsize,
    pub history_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MockBackend {
    pub fn new(rows: LatestRates) -> Self {
        Self {
            rows: Mutex::new(rows),
            history_points: vec![
                HistoryPoint { timestamp: ts(2024, 1, 1, 8, 0), rate: 1.10, date: None },
                HistoryPoint { timestamp: ts(2024, 1, 1, 20, 0), rate: 1.20, date: None },
                HistoryPoint { timestamp: ts(2024, 1, 2, 10, 0), rate: 1.30, date: None },
            ],
            delay: None,
            fail_latest: AtomicBool::new(false),
            fail_history: AtomicBool::new(false),
            fail_fetch: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            latest_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_history(mut self, points: Vec<HistoryPoint>) -> Self {
        self.history_points = points;
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn server_error() -> CoreError {
        CoreError::Server {
            status: 500,
            body: "boom".into(),
        }
    }
}

#[async_trait]
impl RatesBackend for MockBackend {
    fn name(&self) -> &str {
        "MockBackend"
    }

    async fn latest_rates(&self) -> Result<LatestRates, CoreError> {
        self.latest_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_latest.load(Ordering::SeqCst) {
            return Err(CoreError::Network("connection refused".into()));
        }
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn history(&self, query: &HistoryQuery) -> Result<RateHistory, CoreError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_history.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        Ok(RateHistory {
            base_currency: query.pair.base.clone(),
            target_currency: query.pair.target.clone(),
            start_date: query.start_param(),
            end_date: query.end_param(),
            count: self.history_points.len(),
            history: self.history_points.clone(),
        })
    }

    async fn fetch_now(&self) -> Result<(), CoreError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        Ok(())
    }

    async fn delete_pair(&self, pair: &PairKey) -> Result<(), CoreError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.stall().await;
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(Self::server_error());
        }
        let mut rows = self.rows.lock().unwrap();
        rows.rates.retain(|r| &r.pair_key() != pair);
        rows.count = rows.rates.len();
        Ok(())
    }
}
