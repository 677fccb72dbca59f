//! Construction of the shared DataFusion session handle.
//!
//! The reconciler reads `information_schema.tables`, so the schema catalog
//! must be enabled on every session this crate touches; building contexts
//! here keeps that invariant in one place.

use datafusion::execution::config::SessionConfig;
use datafusion::prelude::SessionContext;

use crate::config::EngineConfig;

/// Creates the shared engine session.
///
/// The returned context is cheaply clonable; clones share catalog and
/// execution state, which is how the reconciler and profiler share one
/// engine connection.
pub fn session_context(config: &EngineConfig) -> SessionContext {
    let mut session_config = SessionConfig::default().with_information_schema(true);
    if let Some(partitions) = config.target_partitions {
        session_config = session_config.with_target_partitions(partitions);
    }
    if let Some(batch_size) = config.batch_size {
        session_config = session_config.with_batch_size(batch_size);
    }
    SessionContext::new_with_config(session_config)
}
