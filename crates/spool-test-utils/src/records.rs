//! Inventory record builders

use serde_json::{Value, json};
use spool_inventory::{FilamentRecord, Inventory, SpoolRecord, VendorRecord};

/// A vendor with just an id and a name.
pub fn vendor(id: i64, name: &str) -> VendorRecord {
    serde_json::from_value(json!({"id": id, "name": name})).unwrap()
}

/// A filament with the fields most templates touch.
pub fn filament(id: i64, material: &str) -> FilamentRecord {
    filament_with(id, material, json!({}))
}

/// A filament with extra fields merged over the base record.
pub fn filament_with(id: i64, material: &str, fields: Value) -> FilamentRecord {
    let mut base = json!({
        "id": id,
        "name": format!("Filament {id}"),
        "material": material,
        "vendor": {"id": 1, "name": "Generic"},
        "density": 1.24,
        "diameter": 1.75,
        "settings_extruder_temp": 200,
        "settings_bed_temp": 60,
    });
    if let (Some(base_map), Some(extra_map)) = (base.as_object_mut(), fields.as_object()) {
        for (key, value) in extra_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(base).unwrap()
}

/// An active spool holding `filament`.
pub fn spool(id: i64, filament: &FilamentRecord) -> SpoolRecord {
    spool_with(id, filament, json!({}))
}

/// A spool with extra fields merged over the base record.
pub fn spool_with(id: i64, filament: &FilamentRecord, fields: Value) -> SpoolRecord {
    let mut base = json!({
        "id": id,
        "filament": serde_json::to_value(filament).unwrap(),
        "remaining_weight": 750.0,
        "archived": false,
    });
    if let (Some(base_map), Some(extra_map)) = (base.as_object_mut(), fields.as_object()) {
        for (key, value) in extra_map {
            base_map.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(base).unwrap()
}

/// Assemble an inventory snapshot from spools (filaments are taken from the
/// spools' embedded records, mirroring what the service returns).
pub fn inventory_of(spools: Vec<SpoolRecord>) -> Inventory {
    Inventory::assemble(vec![], vec![], spools)
}
