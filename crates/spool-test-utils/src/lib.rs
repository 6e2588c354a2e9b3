//! Shared test utilities for the spoolsync workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication across
//! crate test suites. It is a dev-dependency only — never published.
//!
//! # Modules
//!
//! - [`records`] — inventory record builders
//! - [`scripted`] — a scripted, in-memory [`InventoryApi`] implementation
//! - [`templates`] — template directory builders
//!
//! [`InventoryApi`]: spool_inventory::InventoryApi

pub mod records;
pub mod scripted;
pub mod templates;

pub use records::{filament, filament_with, inventory_of, spool, spool_with, vendor};
pub use scripted::ScriptedInventory;
pub use templates::{TemplateDir, superslicer_defaults};
