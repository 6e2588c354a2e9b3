//! End-to-end reconciliation scenarios
//!
//! Each test drives a real engine against a scripted inventory, real
//! template files, and a real output directory.

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use spool_core::{ReconciliationEngine, Slicer, SpoolSelection, SyncConfig};
use spool_fs::read_text;
use spool_inventory::Inventory;
use spool_test_utils::{
    ScriptedInventory, TemplateDir, filament, filament_with, inventory_of, spool, spool_with,
    superslicer_defaults,
};

fn config_for(templates: &TemplateDir, out: &TempDir) -> SyncConfig {
    SyncConfig {
        output_dir: out.path().to_path_buf(),
        slicer: Slicer::SuperSlicer,
        inventory_url: "http://localhost:7912".to_string(),
        template_root: templates.root().to_path_buf(),
        variants: vec![],
        delete_all: false,
        additive_only: false,
        per_spool: None,
    }
}

fn engine_for(
    templates: &TemplateDir,
    out: &TempDir,
    client: &ScriptedInventory,
    tweak: impl FnOnce(&mut SyncConfig),
) -> ReconciliationEngine<ScriptedInventory> {
    let mut config = config_for(templates, out);
    tweak(&mut config);
    ReconciliationEngine::new(config, client.clone()).unwrap()
}

fn pla_inventory() -> Inventory {
    let pla = filament(1, "PLA");
    inventory_of(vec![spool(10, &pla)])
}

#[tokio::test]
async fn rendered_content_round_trips_verbatim() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let pla = filament_with(1, "PLA", serde_json::json!({"settings_extruder_temp": 200}));
    let client = ScriptedInventory::new(inventory_of(vec![spool(10, &pla)]));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    engine.sync().await.unwrap();

    let content = read_text(&out.path().join("Filament 1.ini")).unwrap();
    assert!(content.contains("temp=200"), "content: {content}");
}

#[tokio::test]
async fn resyncing_an_unchanged_inventory_is_a_no_op() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let client = ScriptedInventory::new(pla_inventory());
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    let first = engine.sync().await.unwrap();
    let second = engine.sync().await.unwrap();

    assert_eq!(first.created, 1);
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(second.deleted, 0);
    assert_eq!(second.unchanged, 1);
}

#[tokio::test]
async fn material_without_a_template_uses_the_default() {
    let templates = TemplateDir::new("superslicer");
    templates.write("filename.template", "{{ name }}.ini");
    templates.write("default.ini.template", "generic for {{ material }}\n");
    templates.write("PETG.ini.template", "petg tuned\n");
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let petg = filament(2, "PETG");
    let client =
        ScriptedInventory::new(inventory_of(vec![spool(10, &pla), spool(11, &petg)]));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    engine.sync().await.unwrap();

    assert_eq!(
        read_text(&out.path().join("Filament 1.ini")).unwrap(),
        "generic for PLA\n"
    );
    assert_eq!(
        read_text(&out.path().join("Filament 2.ini")).unwrap(),
        "petg tuned\n"
    );
}

#[tokio::test]
async fn deactivated_filament_has_its_file_removed() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let petg = filament(2, "PETG");
    let client =
        ScriptedInventory::new(inventory_of(vec![spool(10, &pla), spool(11, &petg)]));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    engine.sync().await.unwrap();
    assert!(out.path().join("Filament 2.ini").exists());

    // The PETG spool is archived away.
    client.set(inventory_of(vec![spool(10, &pla)]));
    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.deleted, 1);
    assert!(out.path().join("Filament 1.ini").exists());
    assert!(!out.path().join("Filament 2.ini").exists());
}

#[tokio::test]
async fn additive_mode_never_deletes() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let petg = filament(2, "PETG");
    let client =
        ScriptedInventory::new(inventory_of(vec![spool(10, &pla), spool(11, &petg)]));
    let mut engine = engine_for(&templates, &out, &client, |c| c.additive_only = true);

    engine.sync().await.unwrap();
    client.set(inventory_of(vec![spool(10, &pla)]));
    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.deleted, 0);
    assert!(out.path().join("Filament 2.ini").exists());
}

#[tokio::test]
async fn each_variant_gets_its_own_file() {
    let templates = TemplateDir::new("superslicer");
    templates.write(
        "filename.template",
        "{{ name }}-{{ spoolsync.variant }}.ini",
    );
    templates.write(
        "default.ini.template",
        "variant={{ spoolsync.variant }}\n",
    );
    let out = TempDir::new().unwrap();
    let client = ScriptedInventory::new(pla_inventory());
    let mut engine = engine_for(&templates, &out, &client, |c| {
        c.variants = vec!["small".to_string(), "big".to_string()];
    });

    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(
        read_text(&out.path().join("Filament 1-small.ini")).unwrap(),
        "variant=small\n"
    );
    assert_eq!(
        read_text(&out.path().join("Filament 1-big.ini")).unwrap(),
        "variant=big\n"
    );
}

#[tokio::test]
async fn colliding_filenames_are_reported_and_not_written() {
    let templates = TemplateDir::new("superslicer");
    // Material-only names: two PLA filaments collide.
    templates.write("filename.template", "{{ material }}.ini");
    templates.write("default.ini.template", "id={{ id }}\n");
    let out = TempDir::new().unwrap();
    let first = filament(1, "PLA");
    let second = filament(2, "PLA");
    let client =
        ScriptedInventory::new(inventory_of(vec![spool(10, &first), spool(11, &second)]));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.created, 0);
    assert!(!out.path().join("PLA.ini").exists());
    assert_eq!(summary.errors.len(), 1);
    let message = &summary.errors[0].message;
    assert!(message.contains("filaments 1 and 2"), "message: {message}");
}

#[tokio::test]
async fn one_bad_template_does_not_stop_the_batch() {
    let templates = TemplateDir::new("superslicer");
    templates.write("filename.template", "{{ name }}.ini");
    templates.write("default.ini.template", "material={{ material }}\n");
    templates.write("BROKEN.ini.template", "x={{ no_such.field }}\n");
    let out = TempDir::new().unwrap();
    let spools = vec![
        spool(10, &filament(1, "PLA")),
        spool(11, &filament(2, "PETG")),
        spool(12, &filament(3, "BROKEN")),
        spool(13, &filament(4, "ABS")),
        spool(14, &filament(5, "TPU")),
    ];
    let client = ScriptedInventory::new(inventory_of(spools));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.created, 4);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].filament, Some(3));
    for id in [1, 2, 4, 5] {
        assert!(out.path().join(format!("Filament {id}.ini")).exists());
    }
    assert!(!out.path().join("Filament 3.ini").exists());
}

#[tokio::test]
async fn per_spool_all_emits_one_file_per_spool() {
    let templates = TemplateDir::new("superslicer");
    templates.write(
        "filename_for_spool.template",
        "{{ name }}-{{ spool.id }}.ini",
    );
    templates.write("default.ini.template", "spool={{ spool.id }}\n");
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let client =
        ScriptedInventory::new(inventory_of(vec![spool(10, &pla), spool(11, &pla)]));
    let mut engine = engine_for(&templates, &out, &client, |c| {
        c.per_spool = Some(SpoolSelection::All);
    });

    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.created, 2);
    assert_eq!(
        read_text(&out.path().join("Filament 1-10.ini")).unwrap(),
        "spool=10\n"
    );
    assert_eq!(
        read_text(&out.path().join("Filament 1-11.ini")).unwrap(),
        "spool=11\n"
    );
}

#[tokio::test]
async fn per_spool_least_left_picks_one_spool_per_filament() {
    let templates = TemplateDir::new("superslicer");
    templates.write("filename.template", "{{ name }}.ini");
    templates.write(
        "default.ini.template",
        "spool={{ spool.id }} left={{ spool.remaining_weight }}\n",
    );
    let out = TempDir::new().unwrap();
    let pla = filament(1, "PLA");
    let heavy = spool_with(10, &pla, serde_json::json!({"remaining_weight": 900.0}));
    let light = spool_with(11, &pla, serde_json::json!({"remaining_weight": 80.0}));
    let client = ScriptedInventory::new(inventory_of(vec![heavy, light]));
    let mut engine = engine_for(&templates, &out, &client, |c| {
        c.per_spool = Some(SpoolSelection::LeastLeft);
    });

    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(
        read_text(&out.path().join("Filament 1.ini")).unwrap(),
        "spool=11 left=80.0\n"
    );
}

#[tokio::test]
async fn delete_all_sweeps_before_writing() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("stale.ini"), "left over").unwrap();
    std::fs::write(out.path().join("notes.txt"), "unrelated").unwrap();
    let client = ScriptedInventory::new(pla_inventory());
    let mut engine = engine_for(&templates, &out, &client, |c| c.delete_all = true);

    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.deleted, 1);
    assert_eq!(summary.created, 1);
    assert!(!out.path().join("stale.ini").exists());
    assert!(out.path().join("notes.txt").exists());
    assert!(out.path().join("Filament 1.ini").exists());
}

#[tokio::test]
async fn unmanaged_files_survive_normal_reconciliation() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    std::fs::write(out.path().join("hand-tuned.ini"), "mine").unwrap();
    let client = ScriptedInventory::new(pla_inventory());
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    engine.sync().await.unwrap();
    client.set(inventory_of(vec![]));
    let summary = engine.sync().await.unwrap();

    // Our file goes, the hand-written one stays.
    assert_eq!(summary.deleted, 1);
    assert!(out.path().join("hand-tuned.ini").exists());
}

#[tokio::test]
async fn changed_record_updates_the_file_in_place() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let client = ScriptedInventory::new(inventory_of(vec![spool(
        10,
        &filament_with(1, "PLA", serde_json::json!({"settings_extruder_temp": 200})),
    )]));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    engine.sync().await.unwrap();
    client.set(inventory_of(vec![spool(
        10,
        &filament_with(1, "PLA", serde_json::json!({"settings_extruder_temp": 215})),
    )]));
    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.created, 0);
    let content = read_text(&out.path().join("Filament 1.ini")).unwrap();
    assert!(content.contains("temp=215"), "content: {content}");
}

#[tokio::test]
async fn renamed_filament_moves_its_file() {
    let templates = superslicer_defaults();
    let out = TempDir::new().unwrap();
    let client = ScriptedInventory::new(inventory_of(vec![spool(
        10,
        &filament_with(1, "PLA", serde_json::json!({"name": "Old Name"})),
    )]));
    let mut engine = engine_for(&templates, &out, &client, |_| {});

    engine.sync().await.unwrap();
    assert!(out.path().join("Old Name.ini").exists());

    client.set(inventory_of(vec![spool(
        10,
        &filament_with(1, "PLA", serde_json::json!({"name": "New Name"})),
    )]));
    let summary = engine.sync().await.unwrap();

    assert_eq!(summary.created, 1);
    assert_eq!(summary.deleted, 1);
    assert!(!out.path().join("Old Name.ini").exists());
    assert!(out.path().join("New Name.ini").exists());
}
