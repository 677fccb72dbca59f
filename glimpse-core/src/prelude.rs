//! Convenience re-exports for common usage.

pub use crate::config::{CoreConfig, EngineConfig, ProfileConfig, SyncConfig};
pub use crate::engine::session_context;
pub use crate::error::{GlimpseError, Result};
pub use crate::profiler::{
    CategoricalSummary, ColumnProfiler, DescriptiveStatistics, HistogramBucket, NumericSummary,
    ProfilerError, ProfilerResult, TimeGrain, TimeRangeSummary, TopKEntry,
};
pub use crate::reconciler::{
    DispatchError, Dispatcher, EntityStore, ReconcileError, ReconcileResult, Reconciler,
    TableAction, TableEntity, TableReconciler,
};
