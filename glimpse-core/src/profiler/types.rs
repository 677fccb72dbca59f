//! Summary shapes produced by the column profiler.
//!
//! These are the values the derived-state layer folds into a table entity's
//! `summary` field; they are computed on demand and never persisted on their
//! own.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries in a top-K summary.
pub const TOP_K_COUNT: usize = 50;

/// Maximum number of buckets in a numeric histogram.
pub const MAX_HISTOGRAM_BUCKETS: u64 = 40;

/// One entry of a top-K summary.
///
/// `value` is `None` for the null group; `count` is a float because the
/// ranking aggregate is caller-selectable (`count(*)` by default, but e.g.
/// `sum(amount)` is allowed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopKEntry {
    pub value: Option<String>,
    pub count: f64,
}

/// Top-K values and approximate distinct count for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    /// At most [`TOP_K_COUNT`] entries, descending by count.
    pub top_k: Vec<TopKEntry>,
    /// Sketch-based estimate of the number of distinct values.
    pub cardinality: u64,
}

/// Descriptive statistics for a numeric column.
///
/// Quantiles are approximate; the standard deviation is the population
/// variant. All fields are `None` for an empty or all-null column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStatistics {
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

/// One equal-width histogram bucket covering the half-open interval
/// `[low, high)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBucket {
    pub bucket: i64,
    pub low: f64,
    pub high: f64,
    pub count: u64,
}

/// Summary of a numeric column: either descriptive statistics or a
/// fixed-width histogram, depending on which operation produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericSummary {
    Statistics(DescriptiveStatistics),
    Histogram(Vec<HistogramBucket>),
}

impl NumericSummary {
    /// Returns the statistics variant, if that is what this summary holds.
    pub fn as_statistics(&self) -> Option<&DescriptiveStatistics> {
        match self {
            NumericSummary::Statistics(stats) => Some(stats),
            NumericSummary::Histogram(_) => None,
        }
    }

    /// Returns the histogram variant, if that is what this summary holds.
    pub fn as_histogram(&self) -> Option<&[HistogramBucket]> {
        match self {
            NumericSummary::Histogram(buckets) => Some(buckets),
            NumericSummary::Statistics(_) => None,
        }
    }
}

/// Observed time range of a temporal column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRangeSummary {
    pub min: Option<DateTime<Utc>>,
    pub max: Option<DateTime<Utc>>,
    /// `max - min`; `None` when the column holds no values.
    pub interval: Option<Duration>,
}

/// The smallest time grain a user can reliably roll a column up to.
///
/// If data is reported daily, the estimate is [`TimeGrain::Days`]: the
/// finest rollup the data supports, not the precision of the storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeGrain {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeGrain {
    /// Stable lowercase name of the grain.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeGrain::Milliseconds => "milliseconds",
            TimeGrain::Seconds => "seconds",
            TimeGrain::Minutes => "minutes",
            TimeGrain::Hours => "hours",
            TimeGrain::Days => "days",
            TimeGrain::Weeks => "weeks",
            TimeGrain::Months => "months",
            TimeGrain::Years => "years",
        }
    }
}

impl fmt::Display for TimeGrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
