//! Statistical profiling of table columns.
//!
//! The [`ColumnProfiler`] is a stateless query engine: each operation
//! generates SQL against the shared DataFusion session and maps the result
//! rows into one of the summary shapes in [`types`]. Operations are
//! independent and read-only, so callers may run them concurrently with each
//! other and with an in-flight reconciliation pass.
//!
//! ## Available operations
//!
//! - **Null count**: rows where the column is null
//! - **Top-K and cardinality**: most frequent values plus a sketch-based
//!   distinct-count estimate
//! - **Descriptive statistics**: min, quartiles, max, mean, population
//!   standard deviation
//! - **Time grain estimation**: the finest granularity a temporal column can
//!   reliably be rolled up to
//! - **Numeric histogram**: equal-width bucket counts
//! - **Time range**: observed min, max, and span of a temporal column

pub mod column;
pub mod errors;
pub mod types;

pub use column::ColumnProfiler;
pub use errors::{ProfilerError, ProfilerResult};
pub use types::{
    CategoricalSummary, DescriptiveStatistics, HistogramBucket, NumericSummary, TimeGrain,
    TimeRangeSummary, TopKEntry, MAX_HISTOGRAM_BUCKETS, TOP_K_COUNT,
};
