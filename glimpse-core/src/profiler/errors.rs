//! Error types for profiling operations.

use thiserror::Error;

use crate::error::GlimpseError;

/// Result type for profiler operations.
pub type ProfilerResult<T> = Result<T, ProfilerError>;

/// Errors that can occur while profiling a column.
///
/// Every failure propagates to the caller; the profiler never retries and
/// never swallows an engine error.
#[derive(Error, Debug)]
pub enum ProfilerError {
    /// The engine rejected a generated statement. Surfaced unmodified.
    #[error("query execution failed: {0}")]
    QueryExecution(#[from] datafusion::error::DataFusionError),

    /// Arrow computation error while folding result batches.
    #[error("arrow computation failed: {0}")]
    ArrowComputation(#[from] arrow::error::ArrowError),

    /// An identifier or expression failed sanitization; raised before any
    /// engine call is issued.
    #[error(transparent)]
    Security(#[from] GlimpseError),

    /// A result set did not have the expected shape.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl ProfilerError {
    /// Creates an invalid data error with the given message.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }
}
