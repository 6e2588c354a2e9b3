//! Continuous-mode behaviour of the update loop

use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::{mpsc, watch};

use spool_core::{ReconciliationEngine, Slicer, SyncConfig, UpdateLoop};
use spool_fs::read_text;
use spool_inventory::{ChangeKind, ChangeNotification, ResourceKind};
use spool_test_utils::{
    ScriptedInventory, filament, filament_with, inventory_of, spool, superslicer_defaults,
};

const DEBOUNCE: Duration = Duration::from_millis(50);
const SETTLE: Duration = Duration::from_millis(400);

fn notification(id: i64) -> ChangeNotification {
    ChangeNotification {
        resource: ResourceKind::Spool,
        kind: ChangeKind::Updated,
        id: Some(id),
    }
}

fn update_loop(
    client: &ScriptedInventory,
    templates: &spool_test_utils::TemplateDir,
    out: &TempDir,
) -> UpdateLoop<ScriptedInventory> {
    let config = SyncConfig {
        output_dir: out.path().to_path_buf(),
        slicer: Slicer::SuperSlicer,
        inventory_url: "http://localhost:7912".to_string(),
        template_root: templates.root().to_path_buf(),
        variants: vec![],
        delete_all: false,
        additive_only: false,
        per_spool: None,
    };
    let engine = ReconciliationEngine::new(config, client.clone()).unwrap();
    UpdateLoop::new(engine).with_debounce(DEBOUNCE)
}

#[tokio::test]
async fn a_burst_of_five_notifications_syncs_once() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let client = ScriptedInventory::new(inventory_of(vec![spool(10, &pla)]));
    let counter = client.clone();
    let mut update = update_loop(&client, &templates, &out);

    let (events_tx, events_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);
    let looper = tokio::spawn(async move { update.run_continuous(events_rx, stop_rx).await });

    for id in 0..5 {
        events_tx.send(notification(id)).await.unwrap();
    }
    tokio::time::sleep(SETTLE).await;

    // One initial sync, then exactly one for the whole burst.
    assert_eq!(counter.fetch_count(), 2);

    stop_tx.send(true).unwrap();
    looper.await.unwrap().unwrap();
}

#[tokio::test]
async fn spaced_notifications_sync_separately() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let client = ScriptedInventory::new(inventory_of(vec![spool(10, &pla)]));
    let counter = client.clone();
    let mut update = update_loop(&client, &templates, &out);

    let (events_tx, events_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);
    let looper = tokio::spawn(async move { update.run_continuous(events_rx, stop_rx).await });

    events_tx.send(notification(1)).await.unwrap();
    tokio::time::sleep(SETTLE).await;
    events_tx.send(notification(2)).await.unwrap();
    tokio::time::sleep(SETTLE).await;

    assert_eq!(counter.fetch_count(), 3);

    stop_tx.send(true).unwrap();
    looper.await.unwrap().unwrap();
}

#[tokio::test]
async fn inventory_change_lands_on_disk_after_a_notification() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let client = ScriptedInventory::new(inventory_of(vec![spool(
        10,
        &filament_with(1, "PLA", serde_json::json!({"settings_extruder_temp": 200})),
    )]));
    let scripted = client.clone();
    let mut update = update_loop(&client, &templates, &out);

    let (events_tx, events_rx) = mpsc::channel(16);
    let (stop_tx, stop_rx) = watch::channel(false);
    let looper = tokio::spawn(async move { update.run_continuous(events_rx, stop_rx).await });

    tokio::time::sleep(SETTLE).await;
    let path = out.path().join("Filament 1.ini");
    assert!(read_text(&path).unwrap().contains("temp=200"));

    scripted.set(inventory_of(vec![spool(
        10,
        &filament_with(1, "PLA", serde_json::json!({"settings_extruder_temp": 230})),
    )]));
    events_tx.send(notification(10)).await.unwrap();
    tokio::time::sleep(SETTLE).await;

    assert!(read_text(&path).unwrap().contains("temp=230"));

    stop_tx.send(true).unwrap();
    looper.await.unwrap().unwrap();
}

#[tokio::test]
async fn stop_signal_ends_the_loop_between_cycles() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let client = ScriptedInventory::new(inventory_of(vec![spool(10, &pla)]));
    let mut update = update_loop(&client, &templates, &out);

    let (_events_tx, events_rx) = mpsc::channel::<ChangeNotification>(16);
    let (stop_tx, stop_rx) = watch::channel(false);
    let looper = tokio::spawn(async move { update.run_continuous(events_rx, stop_rx).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    stop_tx.send(true).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(2), looper)
        .await
        .expect("loop should stop promptly")
        .unwrap();
    assert!(result.is_ok());
}
