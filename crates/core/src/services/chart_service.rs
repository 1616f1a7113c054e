use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, Utc};
use std::collections::BTreeMap;

use crate::models::chart::{AxisRange, ChartPoint, ChartSeries};
use crate::models::rate::RateSample;

/// Relative axis padding applied to a non-flat series.
const AXIS_PADDING_RATIO: f64 = 0.1;

/// Absolute axis padding for a flat series (all days equal).
const FLAT_AXIS_PADDING: f64 = 0.0001;

/// Turns raw rate samples into a chart-ready daily series.
///
/// Renderers draw the returned series as is.
/// Grouping is always by UTC calendar date; the display offset only
/// affects the day labels.
#[derive(Debug, Clone)]
pub struct ChartService {
    display_offset: FixedOffset,
}

impl ChartService {
    /// Bucketer labelling days in UTC.
    pub fn new() -> Self {
        Self {
            display_offset: Utc.fix(),
        }
    }

    /// Bucketer labelling days in the given offset.
    pub fn with_offset(display_offset: FixedOffset) -> Self {
        Self { display_offset }
    }

    /// Bucketer labelling days in the machine's current local offset.
    pub fn local() -> Self {
        Self::with_offset(*Local::now().offset())
    }

    pub fn display_offset(&self) -> FixedOffset {
        self.display_offset
    }

    /// Build the daily series for one pair.
    ///
    /// 1. Group samples by the UTC date of their timestamp
    /// 2. Average each group (summed in timestamp order, so input order never
    ///    changes the result)
    /// 3. Label each day "Mon D" from its earliest timestamp
    /// 4. Sort days ascending
    /// 5. Derive latest/min/max and the padded axis range
    ///
    /// Samples with a non-finite rate are skipped.
    pub fn build_series(&self, samples: &[RateSample]) -> ChartSeries {
        let mut ordered: Vec<&RateSample> = samples
            .iter()
            .filter(|s| {
                if s.rate.is_finite() {
                    true
                } else {
                    tracing::warn!(pair = %s.pair_key(), timestamp = %s.timestamp, rate = s.rate, "skipping non-finite rate");
                    false
                }
            })
            .collect();
        ordered.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.rate.total_cmp(&b.rate))
        });

        let mut buckets: BTreeMap<NaiveDate, Bucket> = BTreeMap::new();
        for sample in ordered {
            buckets
                .entry(sample.timestamp.date_naive())
                .or_insert_with(|| Bucket::new(sample.timestamp))
                .add(sample.rate);
        }

        let mut points: Vec<ChartPoint> = buckets
            .into_values()
            .map(|bucket| ChartPoint {
                day_label: self.day_label(bucket.first_seen),
                average_rate: bucket.average(),
                sort_key: bucket.first_seen,
            })
            .collect();
        points.sort_by_key(|p| p.sort_key);

        let latest = points.last().map(|p| p.average_rate);
        let min = points.iter().map(|p| p.average_rate).reduce(f64::min);
        let max = points.iter().map(|p| p.average_rate).reduce(f64::max);

        ChartSeries {
            points,
            latest,
            min,
            max,
            axis: axis_range(min, max),
        }
    }

    /// Short month name + day number, e.g. "Jan 5".
    pub fn day_label(&self, timestamp: DateTime<Utc>) -> String {
        timestamp
            .with_timezone(&self.display_offset)
            .format("%b %-d")
            .to_string()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}

/// Padded value-axis range for a series with the given extremes.
///
/// A series with spread gets 10% of the spread on each side; a flat one gets
/// a fixed 0.0001. Without data the range is left to the renderer.
pub fn axis_range(min: Option<f64>, max: Option<f64>) -> AxisRange {
    let (Some(min), Some(max)) = (min, max) else {
        return AxisRange::Auto;
    };
    let range = max - min;
    let padding = if range > 0.0 {
        range * AXIS_PADDING_RATIO
    } else {
        FLAT_AXIS_PADDING
    };
    AxisRange::Bounds {
        low: min - padding,
        high: max + padding,
    }
}

/// Running sum of one calendar day.
struct Bucket {
    first_seen: DateTime<Utc>,
    sum: f64,
    count: usize,
}

impl Bucket {
    fn new(first_seen: DateTime<Utc>) -> Self {
        Self {
            first_seen,
            sum: 0.0,
            count: 0,
        }
    }

    fn add(&mut self, rate: f64) {
        self.sum += rate;
        self.count += 1;
    }

    fn average(&self) -> f64 {
        self.sum / self.count as f64
    }
}
