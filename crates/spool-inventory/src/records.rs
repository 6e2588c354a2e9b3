//! Typed inventory records
//!
//! Records are immutable snapshots of what the service returned; a refetch
//! replaces them wholesale. Unknown fields are kept in a flattened `extra`
//! map so templates can reach everything the service knows about, not just
//! the fields this tool has opinions on.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// A filament manufacturer, nested inside [`FilamentRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorRecord {
    pub id: i64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One inventory filament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilamentRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<VendorRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diameter: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_extruder_temp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_bed_temp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One physical spool of a filament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpoolRecord {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filament: Option<FilamentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filament_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registered: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpoolRecord {
    /// The id of the filament this spool holds, embedded or referenced.
    pub fn filament_ref(&self) -> Option<i64> {
        self.filament.as_ref().map(|f| f.id).or(self.filament_id)
    }
}

/// A joined snapshot of the whole inventory, keyed by record id.
///
/// `BTreeMap` keys keep iteration order stable across fetches, which the
/// engine relies on for deterministic processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    pub vendors: BTreeMap<i64, VendorRecord>,
    pub filaments: BTreeMap<i64, FilamentRecord>,
    pub spools: BTreeMap<i64, SpoolRecord>,
}

impl Inventory {
    /// Assemble a snapshot from the three raw fetches, resolving the
    /// `vendor_id` / `filament_id` references the service sometimes returns
    /// instead of embedded records.
    pub fn assemble(
        vendors: Vec<VendorRecord>,
        filaments: Vec<FilamentRecord>,
        spools: Vec<SpoolRecord>,
    ) -> Self {
        let vendors: BTreeMap<i64, VendorRecord> =
            vendors.into_iter().map(|v| (v.id, v)).collect();

        let mut filament_map: BTreeMap<i64, FilamentRecord> = BTreeMap::new();
        for mut filament in filaments {
            attach_vendor(&mut filament, &vendors);
            filament_map.insert(filament.id, filament);
        }

        let mut spool_map: BTreeMap<i64, SpoolRecord> = BTreeMap::new();
        for mut spool in spools {
            match spool.filament.take() {
                Some(mut embedded) => {
                    // A spool's embedded filament is the freshest copy we have.
                    attach_vendor(&mut embedded, &vendors);
                    filament_map.insert(embedded.id, embedded.clone());
                    spool.filament = Some(embedded);
                }
                None => {
                    if let Some(id) = spool.filament_id {
                        spool.filament = filament_map.get(&id).cloned();
                    }
                }
            }
            spool_map.insert(spool.id, spool);
        }

        Self {
            vendors,
            filaments: filament_map,
            spools: spool_map,
        }
    }

    /// Spools that are not archived and resolve to a known filament.
    pub fn active_spools(&self) -> impl Iterator<Item = &SpoolRecord> {
        self.spools
            .values()
            .filter(|s| !s.archived && s.filament.is_some())
    }

    /// Active spools of one filament, in spool-id order.
    pub fn active_spools_of(&self, filament_id: i64) -> Vec<&SpoolRecord> {
        self.active_spools()
            .filter(|s| s.filament_ref() == Some(filament_id))
            .collect()
    }

    /// Filaments backed by at least one active spool, in id order.
    pub fn active_filaments(&self) -> Vec<&FilamentRecord> {
        let ids: BTreeMap<i64, ()> = self
            .active_spools()
            .filter_map(|s| s.filament_ref())
            .map(|id| (id, ()))
            .collect();
        ids.keys()
            .filter_map(|id| self.filaments.get(id))
            .collect()
    }
}

fn attach_vendor(filament: &mut FilamentRecord, vendors: &BTreeMap<i64, VendorRecord>) {
    if filament.vendor.is_none()
        && let Some(vendor_id) = filament.vendor_id
    {
        filament.vendor = vendors.get(&vendor_id).cloned();
    }
}

/// Which kind of record a change event concerns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Filament,
    Spool,
    Vendor,
}

/// What happened to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

/// One message from the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub resource: ResourceKind,
    pub kind: ChangeKind,
    pub id: Option<i64>,
}

#[derive(Deserialize)]
struct WireEvent {
    #[serde(rename = "type")]
    kind: ChangeKind,
    resource: ResourceKind,
    #[serde(default)]
    payload: Value,
}

impl ChangeNotification {
    /// Parse a raw push-channel message.
    ///
    /// # Errors
    ///
    /// Returns a schema error when the message is not a known change event.
    pub fn parse(text: &str) -> Result<Self> {
        let event: WireEvent = serde_json::from_str(text).map_err(|e| Error::Schema {
            url: "push channel".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            resource: event.resource,
            kind: event.kind,
            id: event.payload.get("id").and_then(Value::as_i64),
        })
    }
}
