use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::period::TimePeriod;
use super::rate::PairKey;

/// A single data point for history chart rendering: one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Short month + day, e.g. "Jan 5"
    pub day_label: String,

    /// Mean of all rates observed on this day
    pub average_rate: f64,

    /// Representative timestamp of the day, used for ordering
    pub sort_key: DateTime<Utc>,
}

/// Value-axis range for the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AxisRange {
    /// No data: let the renderer pick.
    Auto,
    Bounds { low: f64, high: f64 },
}

/// Chart-ready series plus the summary stats shown above the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub points: Vec<ChartPoint>,

    /// Average of the most recent day
    pub latest: Option<f64>,

    pub min: Option<f64>,
    pub max: Option<f64>,

    pub axis: AxisRange,
}

impl ChartSeries {
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            latest: None,
            min: None,
            max: None,
            axis: AxisRange::Auto,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Default for ChartSeries {
    fn default() -> Self {
        Self::empty()
    }
}

/// A bucketed history, tagged with the selection it was requested for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairChart {
    pub pair: PairKey,
    pub period: TimePeriod,
    pub series: ChartSeries,
}

/// Format a rate for display (4 decimal places).
pub fn format_rate(rate: f64) -> String {
    format!("{rate:.4}")
}
