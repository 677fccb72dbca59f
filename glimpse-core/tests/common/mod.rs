//! Shared fixtures for integration tests: in-memory tables registered with a
//! DataFusion session, plus mock implementations of the store and dispatcher
//! traits the reconciler consumes.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use arrow::array::{Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;

use glimpse_core::config::EngineConfig;
use glimpse_core::engine;
use glimpse_core::reconciler::{DispatchError, Dispatcher, EntityStore, TableAction, TableEntity};

/// Engine session with the information schema enabled.
pub fn session() -> SessionContext {
    engine::session_context(&EngineConfig::default())
}

fn register(ctx: &SessionContext, name: &str, schema: Arc<Schema>, batch: RecordBatch) {
    let table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    ctx.register_table(name, Arc::new(table)).unwrap();
}

/// Registers a single-column Float64 table named `name` with column
/// `reading`.
pub fn register_readings(ctx: &SessionContext, name: &str, values: Vec<Option<f64>>) {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "reading",
        DataType::Float64,
        true,
    )]));
    let batch =
        RecordBatch::try_new(schema.clone(), vec![Arc::new(Float64Array::from(values))]).unwrap();
    register(ctx, name, schema, batch);
}

/// Registers a single-column Utf8 table named `name` with column `category`.
pub fn register_categories(ctx: &SessionContext, name: &str, values: Vec<Option<&str>>) {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "category",
        DataType::Utf8,
        true,
    )]));
    let batch =
        RecordBatch::try_new(schema.clone(), vec![Arc::new(StringArray::from(values))]).unwrap();
    register(ctx, name, schema, batch);
}

/// Registers a two-column table (`category` Utf8, `amount` Float64).
pub fn register_events(ctx: &SessionContext, name: &str, rows: Vec<(Option<&str>, f64)>) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("category", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, false),
    ]));
    let categories: Vec<Option<&str>> = rows.iter().map(|(c, _)| *c).collect();
    let amounts: Vec<f64> = rows.iter().map(|(_, a)| *a).collect();
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(categories)),
            Arc::new(Float64Array::from(amounts)),
        ],
    )
    .unwrap();
    register(ctx, name, schema, batch);
}

/// Registers a single-column millisecond-timestamp table named `name` with
/// column `observed_at`.
pub fn register_timestamps(ctx: &SessionContext, name: &str, millis: Vec<Option<i64>>) {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "observed_at",
        DataType::Timestamp(TimeUnit::Millisecond, None),
        true,
    )]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![Arc::new(TimestampMillisecondArray::from(millis))],
    )
    .unwrap();
    register(ctx, name, schema, batch);
}

/// Fixed, read-only entity store.
#[derive(Debug, Default)]
pub struct VecStore {
    entities: Vec<TableEntity>,
}

impl VecStore {
    pub fn new(entities: Vec<TableEntity>) -> Self {
        Self { entities }
    }
}

impl EntityStore for VecStore {
    fn all(&self) -> Vec<TableEntity> {
        self.entities.clone()
    }

    fn get(&self, id: &str) -> Option<TableEntity> {
        self.entities.iter().find(|e| e.id == id).cloned()
    }
}

/// Dispatcher that records every action, optionally failing on a named one.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    actions: Mutex<Vec<TableAction>>,
    fail_on: Option<&'static str>,
}

impl RecordingDispatcher {
    pub fn failing_on(action: &'static str) -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            fail_on: Some(action),
        }
    }

    pub fn recorded(&self) -> Vec<TableAction> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, action: TableAction) -> Result<(), DispatchError> {
        if self.fail_on == Some(action.name()) {
            return Err(DispatchError::new(action.name(), "induced failure"));
        }
        self.actions.lock().unwrap().push(action);
        Ok(())
    }
}

/// Store and dispatcher in one: dispatched actions are applied to the held
/// entity list, the way the external action layer would.
#[derive(Debug)]
pub struct StateFixture {
    entities: Mutex<Vec<TableEntity>>,
    counter: Mutex<u64>,
}

impl StateFixture {
    pub fn new(initial: Vec<TableEntity>) -> Self {
        Self {
            entities: Mutex::new(initial),
            counter: Mutex::new(0),
        }
    }

    pub fn table_names(&self) -> Vec<String> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.table_name.clone())
            .collect()
    }
}

impl EntityStore for StateFixture {
    fn all(&self) -> Vec<TableEntity> {
        self.entities.lock().unwrap().clone()
    }

    fn get(&self, id: &str) -> Option<TableEntity> {
        self.entities
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }
}

#[async_trait]
impl Dispatcher for StateFixture {
    async fn dispatch(&self, action: TableAction) -> Result<(), DispatchError> {
        let mut entities = self.entities.lock().unwrap();
        match action {
            TableAction::SyncTable { id } => {
                if !entities.iter().any(|e| e.id == id) {
                    return Err(DispatchError::new("sync_table", "unknown entity id"));
                }
            }
            TableAction::AddOrSyncTableFromDb { table_name } => {
                if !entities.iter().any(|e| e.table_name == table_name) {
                    let mut counter = self.counter.lock().unwrap();
                    *counter += 1;
                    entities.push(TableEntity::new(format!("table-{counter}"), table_name));
                }
            }
            TableAction::DropTable { table_name, .. } => {
                entities.retain(|e| e.table_name != table_name);
            }
        }
        Ok(())
    }
}
