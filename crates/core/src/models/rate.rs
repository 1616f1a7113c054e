use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;
use super::period::TimePeriod;
use super::timestamp;

/// ISO-4217 style currency code (e.g., "USD", "EUR", "PLN").
///
/// Validated only where user input enters the library (`parse`).
/// Values coming from the backend are trusted and deserialized as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Number of characters in a currency code.
    pub const LEN: usize = 3;

    /// Parse user input into a currency code.
    /// Input is trimmed and uppercased; the result must be exactly 3 ASCII letters.
    pub fn parse(input: &str) -> Result<Self, CoreError> {
        let code = input.trim().to_uppercase();
        if code.len() == Self::LEN && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(CoreError::Validation(format!(
                "Invalid currency code '{input}': expected exactly {} letters",
                Self::LEN
            )))
        }
    }

    /// Normalize raw text typed into a code field: uppercase, at most 3 characters.
    pub fn normalize_input(raw: &str) -> String {
        raw.to_uppercase().chars().take(Self::LEN).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identity of a tracked pair, rendered as `BASE/TARGET`.
///
/// Used for hidden-set membership and selection equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairKey {
    pub base: CurrencyCode,
    pub target: CurrencyCode,
}

impl PairKey {
    pub fn new(base: CurrencyCode, target: CurrencyCode) -> Self {
        Self { base, target }
    }

    /// Build a pair key from user input, validating both codes.
    pub fn parse(base: &str, target: &str) -> Result<Self, CoreError> {
        Ok(Self::new(CurrencyCode::parse(base)?, CurrencyCode::parse(target)?))
    }

    /// The question put to the user before a pair is permanently deleted.
    pub fn delete_prompt(&self) -> String {
        format!("are you sure you want to permanently delete {self} and all its historical data?")
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.target)
    }
}

impl FromStr for PairKey {
    type Err = CoreError;

    /// Parse the `BASE/TARGET` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (base, target) = s.split_once('/').ok_or_else(|| {
            CoreError::Validation(format!("Invalid pair '{s}': expected BASE/TARGET"))
        })?;
        Self::parse(base, target)
    }
}

/// A single server-issued exchange rate observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    #[serde(rename = "base_currency")]
    pub base: CurrencyCode,

    #[serde(rename = "target_currency")]
    pub target: CurrencyCode,

    pub rate: f64,

    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl RateSample {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.base.clone(), self.target.clone())
    }
}

/// Response of `GET /rates/latest`: the newest sample of every tracked pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestRates {
    pub rates: Vec<RateSample>,

    #[serde(default)]
    pub count: usize,

    /// Present when the backend tracks no pairs yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One entry of a history response. The pair is implied by the envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,

    pub rate: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

/// Response of `GET /rates/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateHistory {
    pub base_currency: CurrencyCode,
    pub target_currency: CurrencyCode,

    /// Echo of the requested start, as sent.
    pub start_date: String,

    /// Echo of the requested end, as sent.
    pub end_date: String,

    pub history: Vec<HistoryPoint>,

    #[serde(default)]
    pub count: usize,
}

impl RateHistory {
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.base_currency.clone(), self.target_currency.clone())
    }

    /// Expand the history into full samples carrying the pair.
    pub fn samples(&self) -> Vec<RateSample> {
        self.history
            .iter()
            .map(|p| RateSample {
                base: self.base_currency.clone(),
                target: self.target_currency.clone(),
                rate: p.rate,
                timestamp: p.timestamp,
            })
            .collect()
    }
}

/// Parameters of a history request; also its cache identity.
///
/// Dates are calendar dates (no time of day), sent as `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HistoryQuery {
    pub pair: PairKey,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HistoryQuery {
    pub fn new(pair: PairKey, start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::Validation(format!(
                "Start date {start} must not be after end date {end}"
            )));
        }
        Ok(Self { pair, start, end })
    }

    /// The query covering `period` up to and including `today`.
    pub fn for_period(pair: PairKey, period: TimePeriod, today: NaiveDate) -> Self {
        let (start, end) = period.date_range(today);
        Self { pair, start, end }
    }

    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}
