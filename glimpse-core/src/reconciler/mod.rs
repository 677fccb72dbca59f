//! Periodic reconciliation of live engine tables against persisted entities.
//!
//! One pass fetches the engine's current table list, diffs it against the
//! [`EntityStore`], and drives the external [`Dispatcher`] with the minimal
//! action sequence: `sync_table` for names present on both sides,
//! `add_or_sync_table_from_db` for live names the store is missing, and
//! `drop_table` for stored names the engine no longer reports.
//!
//! Passes never overlap: the loop sleeps *after* each completed pass rather
//! than ticking on a fixed wall-clock grid, so a slow pass simply delays the
//! next one. A failed pass aborts at the failing dispatch (actions already
//! applied stand, there is no rollback), is logged at `warn` level, and the
//! loop retries on the next tick — transient store/engine divergence heals
//! on the next successful pass.

pub mod actions;
pub mod store;

pub use actions::{DispatchError, Dispatcher, TableAction};
pub use store::{EntityStore, TableEntity};

use std::sync::Arc;

use arrow::array::StringArray;
use async_trait::async_trait;
use datafusion::prelude::SessionContext;
use indexmap::IndexMap;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

use crate::config::SyncConfig;

/// Result type for reconciliation operations.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

/// Errors that can abort a reconciliation pass.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// The engine rejected the table-listing statement.
    #[error("query execution failed: {0}")]
    QueryExecution(#[from] datafusion::error::DataFusionError),

    /// A dispatched action failed; the pass stops at this point.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The table listing did not have the expected shape.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Capability interface for engine-connection reconcilers.
#[async_trait]
pub trait Reconciler: Send + Sync {
    /// Runs one pass, then schedules recurring passes.
    async fn init(&mut self) -> ReconcileResult<()>;

    /// Runs a single reconciliation pass.
    async fn sync(&self) -> ReconcileResult<()>;

    /// Stops future scheduled passes. Idempotent; an in-flight pass runs to
    /// completion.
    fn destroy(&mut self);
}

const LIVE_TABLES_SQL: &str = "SELECT table_name FROM information_schema.tables \
     WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
     ORDER BY table_name";

/// Keeps the entity store in step with the tables the engine reports.
///
/// Requires a session with the information schema enabled; contexts built by
/// [`crate::engine::session_context`] qualify. Dropping the reconciler also
/// stops the scheduled loop (the stop signal closes with it).
pub struct TableReconciler {
    inner: Arc<Inner>,
    config: SyncConfig,
    shutdown: Option<watch::Sender<bool>>,
    worker: Option<JoinHandle<()>>,
}

struct Inner {
    ctx: SessionContext,
    store: Arc<dyn EntityStore>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl TableReconciler {
    /// Creates a reconciler over the shared engine session.
    pub fn new(
        ctx: SessionContext,
        store: Arc<dyn EntityStore>,
        dispatcher: Arc<dyn Dispatcher>,
        config: SyncConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                store,
                dispatcher,
            }),
            config,
            shutdown: None,
            worker: None,
        }
    }

    /// Whether the recurring loop is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.shutdown.is_some()
    }
}

#[async_trait]
impl Reconciler for TableReconciler {
    async fn init(&mut self) -> ReconcileResult<()> {
        self.inner.reconcile().await?;

        if !self.config.auto_sync || self.shutdown.is_some() {
            return Ok(());
        }

        let (tx, mut rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let interval = self.config.interval;
        let worker = tokio::spawn(async move {
            loop {
                // Racing only the sleep keeps an in-flight pass uncancelled,
                // and sleeping after the pass keeps passes from overlapping.
                tokio::select! {
                    _ = rx.changed() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
                if let Err(error) = inner.reconcile().await {
                    warn!(%error, "reconciliation pass failed; retrying on next tick");
                }
            }
        });
        self.shutdown = Some(tx);
        self.worker = Some(worker);
        Ok(())
    }

    async fn sync(&self) -> ReconcileResult<()> {
        self.inner.reconcile().await
    }

    fn destroy(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        self.worker.take();
    }
}

impl Inner {
    #[instrument(skip(self))]
    async fn reconcile(&self) -> ReconcileResult<()> {
        let live = self.live_tables().await?;

        // Working set of persisted entities keyed by table name, in store
        // order. Entries still present after the live scan belong to tables
        // the engine no longer reports.
        let mut pending: IndexMap<String, TableEntity> = IndexMap::new();
        for entity in self.store.all() {
            pending.insert(entity.table_name.clone(), entity);
        }
        debug!(live = live.len(), tracked = pending.len(), "reconciling");

        for table_name in live {
            match pending.shift_remove(&table_name) {
                Some(entity) => {
                    self.dispatcher
                        .dispatch(TableAction::SyncTable { id: entity.id })
                        .await?;
                }
                None => {
                    self.dispatcher
                        .dispatch(TableAction::AddOrSyncTableFromDb { table_name })
                        .await?;
                }
            }
        }

        for (_, entity) in pending {
            self.dispatcher
                .dispatch(TableAction::DropTable {
                    table_name: entity.table_name,
                    suppress_artifact_removal: true,
                })
                .await?;
        }
        Ok(())
    }

    async fn live_tables(&self) -> ReconcileResult<Vec<String>> {
        let batches = self.ctx.sql(LIVE_TABLES_SQL).await?.collect().await?;
        let mut names = Vec::new();
        for batch in &batches {
            let column = batch
                .column(0)
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| {
                    ReconcileError::InvalidData("expected a utf8 table_name column".to_string())
                })?;
            for row in 0..batch.num_rows() {
                names.push(column.value(row).to_string());
            }
        }
        Ok(names)
    }
}
