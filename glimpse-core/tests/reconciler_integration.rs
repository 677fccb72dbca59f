//! Integration tests for the table reconciliation loop.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use glimpse_core::config::SyncConfig;
use glimpse_core::reconciler::{
    Dispatcher, EntityStore, ReconcileError, Reconciler, TableAction, TableEntity, TableReconciler,
};

fn sync_config(interval_ms: u64) -> SyncConfig {
    SyncConfig {
        auto_sync: true,
        interval: Duration::from_millis(interval_ms),
    }
}

#[tokio::test]
async fn a_pass_emits_sync_add_then_drop() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);
    register_readings(&ctx, "bravo", vec![Some(2.0)]);

    let store = Arc::new(VecStore::new(vec![
        TableEntity::new("t0", "alpha"),
        TableEntity::new("t1", "charlie"),
    ]));
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let reconciler = TableReconciler::new(
        ctx,
        store,
        dispatcher.clone() as Arc<dyn Dispatcher>,
        SyncConfig::default(),
    );

    reconciler.sync().await.unwrap();

    assert_eq!(
        dispatcher.recorded(),
        vec![
            TableAction::SyncTable { id: "t0".into() },
            TableAction::AddOrSyncTableFromDb {
                table_name: "bravo".into()
            },
            TableAction::DropTable {
                table_name: "charlie".into(),
                suppress_artifact_removal: true
            },
        ]
    );
}

#[tokio::test]
async fn after_a_pass_the_store_mirrors_the_engine() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);
    register_readings(&ctx, "bravo", vec![Some(2.0)]);

    let fixture = Arc::new(StateFixture::new(vec![
        TableEntity::new("t0", "alpha"),
        TableEntity::new("t1", "charlie"),
    ]));
    let reconciler = TableReconciler::new(
        ctx,
        fixture.clone() as Arc<dyn EntityStore>,
        fixture.clone() as Arc<dyn Dispatcher>,
        SyncConfig::default(),
    );

    reconciler.sync().await.unwrap();
    assert_eq!(fixture.table_names(), vec!["alpha", "bravo"]);

    // A second pass is a fixpoint: nothing is added or dropped.
    reconciler.sync().await.unwrap();
    assert_eq!(fixture.table_names(), vec!["alpha", "bravo"]);
}

#[tokio::test]
async fn an_empty_store_adds_every_live_table() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);
    register_readings(&ctx, "bravo", vec![Some(2.0)]);

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let reconciler = TableReconciler::new(
        ctx,
        Arc::new(VecStore::default()),
        dispatcher.clone() as Arc<dyn Dispatcher>,
        SyncConfig::default(),
    );
    reconciler.sync().await.unwrap();

    assert_eq!(
        dispatcher.recorded(),
        vec![
            TableAction::AddOrSyncTableFromDb {
                table_name: "alpha".into()
            },
            TableAction::AddOrSyncTableFromDb {
                table_name: "bravo".into()
            },
        ]
    );
}

#[tokio::test]
async fn a_failed_dispatch_aborts_the_pass_but_keeps_prior_actions() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);
    register_readings(&ctx, "bravo", vec![Some(2.0)]);

    let store = Arc::new(VecStore::new(vec![
        TableEntity::new("t0", "alpha"),
        TableEntity::new("t1", "charlie"),
    ]));
    let dispatcher = Arc::new(RecordingDispatcher::failing_on("add_or_sync_table_from_db"));
    let reconciler = TableReconciler::new(
        ctx,
        store,
        dispatcher.clone() as Arc<dyn Dispatcher>,
        SyncConfig::default(),
    );

    let err = reconciler.sync().await.unwrap_err();
    assert!(matches!(err, ReconcileError::Dispatch(_)));

    // The sync of "alpha" stands; the drop of "charlie" was never reached.
    assert_eq!(
        dispatcher.recorded(),
        vec![TableAction::SyncTable { id: "t0".into() }]
    );
}

#[tokio::test]
async fn init_runs_a_pass_then_schedules_recurring_ones() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let mut reconciler = TableReconciler::new(
        ctx.clone(),
        Arc::new(VecStore::default()),
        dispatcher.clone() as Arc<dyn Dispatcher>,
        sync_config(25),
    );

    reconciler.init().await.unwrap();
    assert!(reconciler.is_running());
    assert!(!dispatcher.recorded().is_empty());

    // A table registered after init is picked up by a later pass.
    register_readings(&ctx, "bravo", vec![Some(2.0)]);
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(dispatcher
        .recorded()
        .contains(&TableAction::AddOrSyncTableFromDb {
            table_name: "bravo".into()
        }));

    reconciler.destroy();
    reconciler.destroy(); // idempotent
    assert!(!reconciler.is_running());

    // Let any in-flight pass settle, then verify the loop is dead.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let settled = dispatcher.recorded().len();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(dispatcher.recorded().len(), settled);
}

#[tokio::test]
async fn auto_sync_disabled_runs_exactly_one_pass() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);

    let dispatcher = Arc::new(RecordingDispatcher::default());
    let mut reconciler = TableReconciler::new(
        ctx,
        Arc::new(VecStore::default()),
        dispatcher.clone() as Arc<dyn Dispatcher>,
        SyncConfig {
            auto_sync: false,
            interval: Duration::from_millis(10),
        },
    );

    reconciler.init().await.unwrap();
    assert!(!reconciler.is_running());

    let after_init = dispatcher.recorded().len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dispatcher.recorded().len(), after_init);
}

#[tokio::test]
async fn a_failing_first_pass_fails_init_and_schedules_nothing() {
    let ctx = session();
    register_readings(&ctx, "alpha", vec![Some(1.0)]);

    let dispatcher = Arc::new(RecordingDispatcher::failing_on("add_or_sync_table_from_db"));
    let mut reconciler = TableReconciler::new(
        ctx,
        Arc::new(VecStore::default()),
        dispatcher.clone() as Arc<dyn Dispatcher>,
        sync_config(10),
    );

    assert!(reconciler.init().await.is_err());
    assert!(!reconciler.is_running());
}
