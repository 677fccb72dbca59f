//! Consumed interface to the persisted-entity collection.

use serde::{Deserialize, Serialize};

/// Durable record representing a tracked table across sessions.
///
/// Exactly one entity exists per live table name; a rename shows up as a
/// drop of the old name followed by an add of the new one, never an
/// in-place rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntity {
    /// Opaque stable identifier.
    pub id: String,
    /// Engine-reported table name.
    pub table_name: String,
}

impl TableEntity {
    pub fn new(id: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            table_name: table_name.into(),
        }
    }
}

/// Ordered, keyed collection of persisted table entities.
///
/// Read-only from this crate's perspective: every mutation flows through the
/// [`Dispatcher`](super::actions::Dispatcher), which preserves the external
/// store's single-writer discipline.
pub trait EntityStore: Send + Sync {
    /// All entities in insertion order.
    fn all(&self) -> Vec<TableEntity>;

    /// Looks up an entity by its stable identifier.
    fn get(&self, id: &str) -> Option<TableEntity>;
}
