//! # Glimpse Core — profiling and reconciliation for data exploration
//!
//! This crate is the engine room of an interactive data-exploration tool
//! built on [DataFusion]. It has two jobs:
//!
//! - **Reconciliation** ([`reconciler`]): keep the application's persisted
//!   model of known tables in step with the tables actually present in the
//!   engine, detecting additions and removals without explicit user action.
//! - **Profiling** ([`profiler`]): compute statistical summaries of
//!   arbitrary columns — null counts, top-K values, approximate
//!   cardinality, descriptive statistics, histograms, time ranges, and
//!   time-grain estimates — by generating SQL and folding the result
//!   batches into typed summary values.
//!
//! Rendering, persistence formats, and wire protocols are explicitly out of
//! scope; the crate exposes summary values and dispatch actions and nothing
//! else.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use glimpse_core::config::CoreConfig;
//! use glimpse_core::engine;
//! use glimpse_core::profiler::ColumnProfiler;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CoreConfig::default().validated()?;
//! let ctx = engine::session_context(&config.engine);
//! // ... register tables with the engine ...
//!
//! let profiler = ColumnProfiler::new(config.profile.clone());
//! let nulls = profiler.null_count(&ctx, "orders", "shipped_at").await?;
//! println!("{nulls} null values");
//! # Ok(())
//! # }
//! ```
//!
//! ## Keeping the store in sync
//!
//! ```rust,ignore
//! let mut reconciler = TableReconciler::new(ctx, store, dispatcher, config.sync);
//! reconciler.init().await?;   // one pass now, then every `interval`
//! // ...
//! reconciler.destroy();       // stop future passes
//! ```
//!
//! The reconciler consumes two host-supplied traits: an
//! [`EntityStore`](reconciler::EntityStore) (read-only, ordered collection
//! of persisted table entities) and a
//! [`Dispatcher`](reconciler::Dispatcher) (executes
//! [`TableAction`](reconciler::TableAction) command values and resolves once
//! downstream state has settled).
//!
//! [DataFusion]: https://datafusion.apache.org

pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod prelude;
pub mod profiler;
pub mod reconciler;
pub mod security;
