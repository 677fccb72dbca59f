//! Dispatch actions the reconciler issues against the external state layer.

use async_trait::async_trait;
use thiserror::Error;

/// Explicit command value for a table-state mutation.
///
/// The reconciler never writes to the store directly; it describes every
/// change as one of these values and hands it to the [`Dispatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableAction {
    /// Refresh the shadow of a table the store already tracks.
    SyncTable { id: String },
    /// Start tracking a live table the store has not seen yet.
    AddOrSyncTableFromDb { table_name: String },
    /// Stop tracking a table the engine no longer reports. With
    /// `suppress_artifact_removal` set, only the engine-backed shadow
    /// disappeared; any user-owned file artifact must be left alone.
    DropTable {
        table_name: String,
        suppress_artifact_removal: bool,
    },
}

impl TableAction {
    /// Stable action name understood by the dispatch framework.
    pub fn name(&self) -> &'static str {
        match self {
            TableAction::SyncTable { .. } => "sync_table",
            TableAction::AddOrSyncTableFromDb { .. } => "add_or_sync_table_from_db",
            TableAction::DropTable { .. } => "drop_table",
        }
    }
}

/// A dispatched action failed downstream.
#[derive(Debug, Error)]
#[error("dispatch of {action} failed: {message}")]
pub struct DispatchError {
    action: String,
    message: String,
}

impl DispatchError {
    /// Creates a dispatch error for the named action.
    pub fn new(action: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            message: message.into(),
        }
    }

    /// Name of the action that failed.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Downstream failure description.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Executes named state-mutating actions.
///
/// `dispatch` resolves only once the mutation and any downstream
/// derived-state recomputation have settled; the reconciler awaits each
/// dispatch before issuing the next to keep passes strictly sequential.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, action: TableAction) -> Result<(), DispatchError>;
}
