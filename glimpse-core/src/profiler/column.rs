//! Stateless statistical query engine over (table, column) pairs.
//!
//! Every operation composes one or more SQL statements against the shared
//! DataFusion session and folds the resulting record batches into the
//! summary shapes of [`super::types`]. Identifiers are sanitized before any
//! statement text is built; engine errors surface to the caller unmodified.

use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, Date64Array, Float32Array, Float64Array,
    Int32Array, Int64Array, LargeStringArray, StringArray, StringViewArray,
    TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use datafusion::prelude::SessionContext;
use tracing::{debug, instrument};

use super::errors::{ProfilerError, ProfilerResult};
use super::types::{
    CategoricalSummary, DescriptiveStatistics, HistogramBucket, NumericSummary, TimeGrain,
    TimeRangeSummary, TopKEntry, MAX_HISTOGRAM_BUCKETS, TOP_K_COUNT,
};
use crate::config::ProfileConfig;
use crate::security;

/// Stateless profiling service.
///
/// Construction only captures configuration; the engine session is passed
/// per call, so one profiler can serve any number of concurrent contexts.
/// Profiling is read-only and safe to run concurrently with an in-flight
/// reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct ColumnProfiler {
    config: ProfileConfig,
}

impl ColumnProfiler {
    /// Creates a profiler with the given configuration.
    pub fn new(config: ProfileConfig) -> Self {
        Self { config }
    }

    /// Counts rows where the column is null.
    #[instrument(skip(self, ctx))]
    pub async fn null_count(
        &self,
        ctx: &SessionContext,
        table: &str,
        column: &str,
    ) -> ProfilerResult<u64> {
        let table_ident = security::escape_identifier(table)?;
        let column_ident = security::escape_identifier(column)?;
        let sql = format!(
            "SELECT COUNT(*) AS null_count FROM {table_ident} WHERE {column_ident} IS NULL"
        );
        let batches = ctx.sql(&sql).await?.collect().await?;
        extract_u64(result_row(&batches)?, 0, "null_count")
    }

    /// Computes the top-K values of a column together with its approximate
    /// distinct count.
    ///
    /// `aggregate` ranks the groups; it defaults to `count(*)` and is
    /// screened before being embedded in the statement.
    #[instrument(skip(self, ctx))]
    pub async fn top_k_and_cardinality(
        &self,
        ctx: &SessionContext,
        table: &str,
        column: &str,
        aggregate: Option<&str>,
    ) -> ProfilerResult<CategoricalSummary> {
        let agg = aggregate.unwrap_or("count(*)");
        security::validate_aggregate_expression(agg)?;
        let table_ident = security::escape_identifier(table)?;
        let column_ident = security::escape_identifier(column)?;

        let top_k_sql = format!(
            "SELECT CAST({column_ident} AS VARCHAR) AS value, {agg} AS frequency \
             FROM {table_ident} \
             GROUP BY CAST({column_ident} AS VARCHAR) \
             ORDER BY frequency DESC \
             LIMIT {TOP_K_COUNT}"
        );
        let batches = ctx.sql(&top_k_sql).await?.collect().await?;
        let mut top_k = Vec::new();
        for batch in &batches {
            for row in 0..batch.num_rows() {
                let value = utf8_value(batch.column(0), row, "value")?;
                let count = numeric_value(batch.column(1), row, "frequency")?.unwrap_or(0.0);
                top_k.push(TopKEntry { value, count });
            }
        }

        let cardinality = self.cardinality(ctx, &table_ident, &column_ident).await?;
        Ok(CategoricalSummary { top_k, cardinality })
    }

    /// Computes min, approximate quartiles, max, mean, and population
    /// standard deviation in a single statement.
    #[instrument(skip(self, ctx))]
    pub async fn descriptive_statistics(
        &self,
        ctx: &SessionContext,
        table: &str,
        column: &str,
    ) -> ProfilerResult<NumericSummary> {
        let table_ident = security::escape_identifier(table)?;
        let column_ident = security::escape_identifier(column)?;
        let value = format!("CAST({column_ident} AS DOUBLE)");
        let sql = format!(
            "SELECT \
                min({value}) AS min_value, \
                approx_percentile_cont(0.25) WITHIN GROUP (ORDER BY {value}) AS q25, \
                approx_percentile_cont(0.5) WITHIN GROUP (ORDER BY {value}) AS q50, \
                approx_percentile_cont(0.75) WITHIN GROUP (ORDER BY {value}) AS q75, \
                max({value}) AS max_value, \
                avg({value}) AS mean, \
                stddev_pop({value}) AS std_dev \
             FROM {table_ident}"
        );
        let batches = ctx.sql(&sql).await?.collect().await?;
        let batch = result_row(&batches)?;

        Ok(NumericSummary::Statistics(DescriptiveStatistics {
            min: extract_optional_f64(batch, 0, "min_value")?,
            q25: extract_optional_f64(batch, 1, "q25")?,
            q50: extract_optional_f64(batch, 2, "q50")?,
            q75: extract_optional_f64(batch, 3, "q75")?,
            max: extract_optional_f64(batch, 4, "max_value")?,
            mean: extract_optional_f64(batch, 5, "mean")?,
            std_dev: extract_optional_f64(batch, 6, "std_dev")?,
        }))
    }

    /// Estimates the smallest time grain present in a temporal column.
    ///
    /// The "smallest time grain" is the finest granularity the user can
    /// reliably roll the column up to: daily-reported data yields
    /// [`TimeGrain::Days`] even though the storage type is
    /// millisecond-precise. Columns larger than the configured sample budget
    /// are Bernoulli-sampled down to roughly that many rows first.
    ///
    /// Known blind spots: quarterly and irregular monthly grains are not
    /// detected, and a column holding a single repeated instant yields
    /// `None`.
    #[instrument(skip(self, ctx))]
    pub async fn estimate_smallest_time_grain(
        &self,
        ctx: &SessionContext,
        table: &str,
        column: &str,
    ) -> ProfilerResult<Option<TimeGrain>> {
        let table_ident = security::escape_identifier(table)?;
        let column_ident = security::escape_identifier(column)?;

        let count_sql = format!("SELECT COUNT(*) AS total FROM {table_ident}");
        let batches = ctx.sql(&count_sql).await?.collect().await?;
        let total = extract_u64(result_row(&batches)?, 0, "total")?;

        // Only sample when there is a lot of data.
        let sample_size = self.config.time_grain_sample_size;
        let sample_clause = if total > sample_size {
            format!(" WHERE random() < {}", sample_size as f64 / total as f64)
        } else {
            String::new()
        };

        let sql = format!(
            "WITH sampled AS ( \
                SELECT {column_ident} AS cd FROM {table_ident}{sample_clause} \
             ) \
             SELECT \
                approx_distinct(CAST(date_part('year', cd) AS BIGINT)) AS years, \
                approx_distinct(CAST(date_part('month', cd) AS BIGINT)) AS months, \
                approx_distinct(CAST(date_part('doy', cd) AS BIGINT)) AS days_of_year, \
                approx_distinct(CAST(date_part('day', cd) AS BIGINT)) AS days_of_month, \
                min(CASE WHEN date_part('day', cd + INTERVAL '1 day') = 1 THEN 1 ELSE 0 END) = 1 \
                    AS last_day_flag, \
                approx_distinct(CAST(date_part('week', cd) AS BIGINT)) AS weeks, \
                approx_distinct(CAST(date_part('dow', cd) AS BIGINT)) AS days_of_week, \
                approx_distinct(CAST(date_part('hour', cd) AS BIGINT)) AS hours, \
                approx_distinct(CAST(date_part('minute', cd) AS BIGINT)) AS minutes, \
                approx_distinct(CAST(floor(date_part('second', cd)) AS BIGINT)) AS seconds, \
                approx_distinct(CAST(date_part('millisecond', cd) - floor(date_part('second', cd)) * 1000 AS BIGINT)) AS millis \
             FROM sampled"
        );
        let batches = ctx.sql(&sql).await?.collect().await?;
        let batch = result_row(&batches)?;

        let counts = TimeGrainCounts {
            years: extract_u64(batch, 0, "years")?,
            months: extract_u64(batch, 1, "months")?,
            days_of_year: extract_u64(batch, 2, "days_of_year")?,
            days_of_month: extract_u64(batch, 3, "days_of_month")?,
            last_day_of_month: extract_bool(batch, 4, "last_day_flag")?,
            weeks: extract_u64(batch, 5, "weeks")?,
            days_of_week: extract_u64(batch, 6, "days_of_week")?,
            hours: extract_u64(batch, 7, "hours")?,
            minutes: extract_u64(batch, 8, "minutes")?,
            seconds: extract_u64(batch, 9, "seconds")?,
            millis: extract_u64(batch, 10, "millis")?,
        };
        let grain = decide_grain(&counts);
        debug!(?counts, ?grain, total, "estimated smallest time grain");
        Ok(grain)
    }

    /// Computes an equal-width histogram over the non-null values of a
    /// numeric or temporal column.
    ///
    /// The bucket count is `min(40, approximate distinct count)`; temporal
    /// columns are converted to epoch seconds, all others cast to double.
    /// Buckets are half-open `[low, high)`, so rows equal to the global
    /// maximum are counted separately and re-added to the bucket whose high
    /// edge equals that maximum. Matching on the edge value is fragile if
    /// floating-point arithmetic ever makes two buckets share a high edge,
    /// but it mirrors how the interval join drops those rows in the first
    /// place.
    #[instrument(skip(self, ctx))]
    pub async fn numeric_histogram(
        &self,
        ctx: &SessionContext,
        table: &str,
        column: &str,
        column_type: &DataType,
    ) -> ProfilerResult<NumericSummary> {
        let table_ident = security::escape_identifier(table)?;
        let column_ident = security::escape_identifier(column)?;

        let cardinality = self.cardinality(ctx, &table_ident, &column_ident).await?;
        let bucket_count = cardinality.min(MAX_HISTOGRAM_BUCKETS);
        if bucket_count == 0 {
            return Ok(NumericSummary::Histogram(Vec::new()));
        }

        let value_expr = if is_temporal(column_type) {
            format!("date_part('epoch', {column_ident})")
        } else {
            format!("CAST({column_ident} AS DOUBLE)")
        };

        let last_bucket = bucket_count - 1;
        let sql = format!(
            "WITH data_table AS ( \
                SELECT {value_expr} AS val FROM {table_ident} WHERE {column_ident} IS NOT NULL \
             ), span AS ( \
                SELECT min(val) AS min_val, max(val) AS max_val, \
                       max(val) - min(val) AS width \
                FROM data_table \
             ), buckets AS ( \
                SELECT r.bucket, \
                       CAST(r.bucket AS DOUBLE) * span.width / {bucket_count} + span.min_val AS low, \
                       CAST(r.bucket + 1 AS DOUBLE) * span.width / {bucket_count} + span.min_val AS high \
                FROM generate_series(0, {last_bucket}) AS r(bucket) CROSS JOIN span \
             ), histogram_stage AS ( \
                SELECT buckets.bucket, buckets.low, buckets.high, \
                       count(data_table.val) AS entries \
                FROM buckets \
                LEFT JOIN data_table \
                  ON data_table.val >= buckets.low AND data_table.val < buckets.high \
                GROUP BY buckets.bucket, buckets.low, buckets.high \
             ), right_edge AS ( \
                SELECT count(*) AS spill \
                FROM data_table CROSS JOIN span \
                WHERE data_table.val = span.max_val \
             ), top_edge AS ( \
                SELECT max(high) AS max_high FROM histogram_stage \
             ) \
             SELECT histogram_stage.bucket, histogram_stage.low, histogram_stage.high, \
                    CASE WHEN histogram_stage.high = top_edge.max_high \
                         THEN histogram_stage.entries + right_edge.spill \
                         ELSE histogram_stage.entries END AS entries \
             FROM histogram_stage CROSS JOIN right_edge CROSS JOIN top_edge \
             ORDER BY bucket"
        );
        let batches = ctx.sql(&sql).await?.collect().await?;

        let mut histogram = Vec::with_capacity(bucket_count as usize);
        for batch in &batches {
            for row in 0..batch.num_rows() {
                histogram.push(HistogramBucket {
                    bucket: i64_value(batch.column(0), row, "bucket")?,
                    low: numeric_value(batch.column(1), row, "low")?.unwrap_or(0.0),
                    high: numeric_value(batch.column(2), row, "high")?.unwrap_or(0.0),
                    count: numeric_value(batch.column(3), row, "entries")?.unwrap_or(0.0) as u64,
                });
            }
        }
        debug!(
            buckets = histogram.len(),
            cardinality, "computed numeric histogram"
        );
        Ok(NumericSummary::Histogram(histogram))
    }

    /// Computes the observed min, max, and span of a temporal column.
    #[instrument(skip(self, ctx))]
    pub async fn time_range(
        &self,
        ctx: &SessionContext,
        table: &str,
        column: &str,
    ) -> ProfilerResult<TimeRangeSummary> {
        let table_ident = security::escape_identifier(table)?;
        let column_ident = security::escape_identifier(column)?;
        let sql = format!(
            "SELECT min({column_ident}) AS min_value, max({column_ident}) AS max_value \
             FROM {table_ident}"
        );
        let batches = ctx.sql(&sql).await?.collect().await?;
        let batch = result_row(&batches)?;

        let min = timestamp_value(batch.column(0), 0)?;
        let max = timestamp_value(batch.column(1), 0)?;
        let interval = match (min, max) {
            (Some(lo), Some(hi)) => (hi - lo).to_std().ok(),
            _ => None,
        };
        Ok(TimeRangeSummary { min, max, interval })
    }

    /// Approximate distinct count of a column. Identifiers must already be
    /// escaped. The VARCHAR cast gives the sketch a hashable input for every
    /// column type.
    async fn cardinality(
        &self,
        ctx: &SessionContext,
        table_ident: &str,
        column_ident: &str,
    ) -> ProfilerResult<u64> {
        let sql = format!(
            "SELECT approx_distinct(CAST({column_ident} AS VARCHAR)) AS cardinality \
             FROM {table_ident}"
        );
        let batches = ctx.sql(&sql).await?.collect().await?;
        extract_u64(result_row(&batches)?, 0, "cardinality")
    }
}

/// Approximate distinct counts of the calendar fields of a sampled column.
#[derive(Debug, Clone, Copy, Default)]
struct TimeGrainCounts {
    years: u64,
    months: u64,
    days_of_year: u64,
    days_of_month: u64,
    /// True when every sampled value falls on the last day of its month.
    last_day_of_month: bool,
    weeks: u64,
    days_of_week: u64,
    hours: u64,
    minutes: u64,
    seconds: u64,
    millis: u64,
}

/// Decides the grain from calendar-field cardinalities, finest first.
///
/// Sub-day variation wins outright. Once the clock fields collapse to a
/// single value the coarser signals are examined in reverse: years (one
/// day-of-year across several years), months (month-start or month-end
/// reporting across several months), weeks (one weekday across several
/// weeks), then days. A column with no observed day-to-day variation at all
/// matches nothing.
fn decide_grain(counts: &TimeGrainCounts) -> Option<TimeGrain> {
    if counts.millis > 1 {
        return Some(TimeGrain::Milliseconds);
    }
    if counts.seconds > 1 {
        return Some(TimeGrain::Seconds);
    }
    if counts.minutes > 1 {
        return Some(TimeGrain::Minutes);
    }
    if counts.hours > 1 {
        return Some(TimeGrain::Hours);
    }
    if counts.days_of_year == 1 && counts.years > 1 {
        return Some(TimeGrain::Years);
    }
    if (counts.days_of_month == 1 || counts.last_day_of_month) && counts.months > 1 {
        return Some(TimeGrain::Months);
    }
    if counts.days_of_week == 1 && counts.weeks > 1 {
        return Some(TimeGrain::Weeks);
    }
    if counts.days_of_year > 1 {
        return Some(TimeGrain::Days);
    }
    None
}

fn is_temporal(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
    )
}

/// Returns the first non-empty batch of an aggregate result.
fn result_row(batches: &[RecordBatch]) -> ProfilerResult<&RecordBatch> {
    batches
        .iter()
        .find(|batch| batch.num_rows() > 0)
        .ok_or_else(|| ProfilerError::invalid_data("query returned no rows"))
}

fn extract_u64(batch: &RecordBatch, index: usize, name: &str) -> ProfilerResult<u64> {
    let column = batch.column(index);
    if column.is_null(0) {
        return Err(ProfilerError::invalid_data(format!(
            "unexpected null in {name}"
        )));
    }
    if let Some(array) = column.as_any().downcast_ref::<UInt64Array>() {
        Ok(array.value(0))
    } else if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
        Ok(array.value(0).max(0) as u64)
    } else {
        Err(ProfilerError::invalid_data(format!(
            "expected an integer column for {name}, got {}",
            column.data_type()
        )))
    }
}

fn extract_optional_f64(
    batch: &RecordBatch,
    index: usize,
    name: &str,
) -> ProfilerResult<Option<f64>> {
    numeric_value(batch.column(index), 0, name)
}

fn extract_bool(batch: &RecordBatch, index: usize, name: &str) -> ProfilerResult<bool> {
    let column = batch.column(index);
    if column.is_null(0) {
        return Ok(false);
    }
    let array = column
        .as_any()
        .downcast_ref::<BooleanArray>()
        .ok_or_else(|| {
            ProfilerError::invalid_data(format!(
                "expected a boolean column for {name}, got {}",
                column.data_type()
            ))
        })?;
    Ok(array.value(0))
}

fn i64_value(column: &ArrayRef, row: usize, name: &str) -> ProfilerResult<i64> {
    if column.is_null(row) {
        return Err(ProfilerError::invalid_data(format!(
            "unexpected null in {name}"
        )));
    }
    if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
        Ok(array.value(row))
    } else if let Some(array) = column.as_any().downcast_ref::<UInt64Array>() {
        Ok(array.value(row) as i64)
    } else {
        Err(ProfilerError::invalid_data(format!(
            "expected an integer column for {name}, got {}",
            column.data_type()
        )))
    }
}

fn numeric_value(column: &ArrayRef, row: usize, name: &str) -> ProfilerResult<Option<f64>> {
    if column.is_null(row) {
        return Ok(None);
    }
    let value = if let Some(array) = column.as_any().downcast_ref::<Float64Array>() {
        array.value(row)
    } else if let Some(array) = column.as_any().downcast_ref::<Float32Array>() {
        array.value(row) as f64
    } else if let Some(array) = column.as_any().downcast_ref::<Int64Array>() {
        array.value(row) as f64
    } else if let Some(array) = column.as_any().downcast_ref::<Int32Array>() {
        array.value(row) as f64
    } else if let Some(array) = column.as_any().downcast_ref::<UInt64Array>() {
        array.value(row) as f64
    } else if let Some(array) = column.as_any().downcast_ref::<UInt32Array>() {
        array.value(row) as f64
    } else {
        return Err(ProfilerError::invalid_data(format!(
            "expected a numeric column for {name}, got {}",
            column.data_type()
        )));
    };
    Ok(Some(value))
}

fn utf8_value(column: &ArrayRef, row: usize, name: &str) -> ProfilerResult<Option<String>> {
    if column.is_null(row) {
        return Ok(None);
    }
    if let Some(array) = column.as_any().downcast_ref::<StringArray>() {
        Ok(Some(array.value(row).to_string()))
    } else if let Some(array) = column.as_any().downcast_ref::<LargeStringArray>() {
        Ok(Some(array.value(row).to_string()))
    } else if let Some(array) = column.as_any().downcast_ref::<StringViewArray>() {
        Ok(Some(array.value(row).to_string()))
    } else {
        Err(ProfilerError::invalid_data(format!(
            "expected a string column for {name}, got {}",
            column.data_type()
        )))
    }
}

fn timestamp_value(column: &ArrayRef, row: usize) -> ProfilerResult<Option<DateTime<Utc>>> {
    if column.is_null(row) {
        return Ok(None);
    }
    let timestamp = match column.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            let array = downcast::<TimestampSecondArray>(column)?;
            DateTime::from_timestamp(array.value(row), 0)
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            let array = downcast::<TimestampMillisecondArray>(column)?;
            DateTime::from_timestamp_millis(array.value(row))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let array = downcast::<TimestampMicrosecondArray>(column)?;
            DateTime::from_timestamp_micros(array.value(row))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            let array = downcast::<TimestampNanosecondArray>(column)?;
            let nanos = array.value(row);
            DateTime::from_timestamp(
                nanos.div_euclid(1_000_000_000),
                nanos.rem_euclid(1_000_000_000) as u32,
            )
        }
        DataType::Date32 => {
            let array = downcast::<Date32Array>(column)?;
            DateTime::from_timestamp(i64::from(array.value(row)) * 86_400, 0)
        }
        DataType::Date64 => {
            let array = downcast::<Date64Array>(column)?;
            DateTime::from_timestamp_millis(array.value(row))
        }
        other => {
            return Err(ProfilerError::invalid_data(format!(
                "expected a temporal column, got {other}"
            )))
        }
    };
    timestamp
        .map(Some)
        .ok_or_else(|| ProfilerError::invalid_data("timestamp out of representable range"))
}

fn downcast<T: 'static>(column: &ArrayRef) -> ProfilerResult<&T> {
    column.as_any().downcast_ref::<T>().ok_or_else(|| {
        ProfilerError::invalid_data(format!(
            "array type {} does not match its declared data type",
            column.data_type()
        ))
    })
}
