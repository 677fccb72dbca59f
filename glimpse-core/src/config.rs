//! Runtime configuration with typed defaults and a validating loader.
//!
//! Every knob is an explicit struct field with a typed default; [`CoreConfig::validated`]
//! is the single gate through which a configuration must pass before it is
//! handed to the engine, the reconciler, or the profiler.

use std::time::Duration;

use crate::error::{GlimpseError, Result};

/// Default delay between reconciliation passes.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_millis(500);

/// Default row budget for time-grain estimation sampling.
pub const DEFAULT_TIME_GRAIN_SAMPLE_SIZE: u64 = 500_000;

/// Settings for the periodic table reconciliation loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Whether `init()` schedules recurring passes after the first one.
    pub auto_sync: bool,
    /// Delay between the end of one pass and the start of the next.
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            interval: DEFAULT_SYNC_INTERVAL,
        }
    }
}

/// Settings for profiling operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    /// Row count above which time-grain estimation samples instead of
    /// scanning the full column.
    pub time_grain_sample_size: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            time_grain_sample_size: DEFAULT_TIME_GRAIN_SAMPLE_SIZE,
        }
    }
}

/// Tuning surface for the shared DataFusion session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    /// Target partition count for parallel query execution.
    pub target_partitions: Option<usize>,
    /// Record-batch size for query execution.
    pub batch_size: Option<usize>,
}

/// Aggregate configuration for the core.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreConfig {
    pub engine: EngineConfig,
    pub sync: SyncConfig,
    pub profile: ProfileConfig,
}

impl CoreConfig {
    /// Sets the reconciliation interval.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync.interval = interval;
        self
    }

    /// Enables or disables recurring reconciliation passes.
    pub fn with_auto_sync(mut self, enabled: bool) -> Self {
        self.sync.auto_sync = enabled;
        self
    }

    /// Sets the sampling budget for time-grain estimation.
    pub fn with_time_grain_sample_size(mut self, rows: u64) -> Self {
        self.profile.time_grain_sample_size = rows;
        self
    }

    /// Sets the target partition count for the engine session.
    pub fn with_target_partitions(mut self, partitions: usize) -> Self {
        self.engine.target_partitions = Some(partitions);
        self
    }

    /// Sets the record-batch size for the engine session.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.engine.batch_size = Some(batch_size);
        self
    }

    /// Validates the configuration, returning it unchanged on success.
    pub fn validated(self) -> Result<Self> {
        if self.sync.interval.is_zero() {
            return Err(GlimpseError::configuration(
                "sync interval must be greater than zero",
            ));
        }
        if self.profile.time_grain_sample_size == 0 {
            return Err(GlimpseError::configuration(
                "time grain sample size must be greater than zero",
            ));
        }
        if self.engine.target_partitions == Some(0) {
            return Err(GlimpseError::configuration(
                "target partitions must be greater than zero",
            ));
        }
        if self.engine.batch_size == Some(0) {
            return Err(GlimpseError::configuration(
                "batch size must be greater than zero",
            ));
        }
        Ok(self)
    }
}
