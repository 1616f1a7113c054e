use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

/// Chart time window selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimePeriod {
    #[serde(rename = "1d")]
    OneDay,
    #[default]
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
}

impl TimePeriod {
    /// All periods in the order they are offered to the user.
    pub const ALL: [TimePeriod; 4] = [
        TimePeriod::OneDay,
        TimePeriod::SevenDays,
        TimePeriod::ThirtyDays,
        TimePeriod::NinetyDays,
    ];

    /// Number of days the window reaches back from today.
    pub fn days(&self) -> u64 {
        match self {
            TimePeriod::OneDay => 1,
            TimePeriod::SevenDays => 7,
            TimePeriod::ThirtyDays => 30,
            TimePeriod::NinetyDays => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::OneDay => "1d",
            TimePeriod::SevenDays => "7d",
            TimePeriod::ThirtyDays => "30d",
            TimePeriod::NinetyDays => "90d",
        }
    }

    /// Calendar date range `(start, end)` ending on `today` (inclusive).
    pub fn date_range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = today
            .checked_sub_days(Days::new(self.days()))
            .unwrap_or(NaiveDate::MIN);
        (start, today)
    }

    /// Date range ending on the current UTC date.
    pub fn date_range_now(&self) -> (NaiveDate, NaiveDate) {
        self.date_range(Utc::now().date_naive())
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimePeriod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimePeriod::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::Validation(format!("Unknown time period: {s}")))
    }
}
