//! Spoolman inventory client
//!
//! Wraps the inventory service's HTTP endpoints and its push-notification
//! channel behind typed records and typed errors. Nothing in this crate
//! touches the filesystem; it is the engine's only window onto the network.

pub mod client;
pub mod error;
pub mod records;
pub mod subscribe;

pub use client::{InventoryApi, InventoryClient};
pub use error::{Error, Result};
pub use records::{
    ChangeKind, ChangeNotification, FilamentRecord, Inventory, ResourceKind, SpoolRecord,
    VendorRecord,
};
pub use subscribe::Subscription;
