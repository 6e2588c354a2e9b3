//! Reconciliation engine for spoolsync
//!
//! This crate turns an inventory snapshot into the set of slicer config
//! files that should exist, and makes the output directory match it:
//!
//! - **SyncConfig**: what to generate, where, and for which slicer
//! - **ReconciliationEngine**: computes the desired file set, diffs it
//!   against its manifest of managed paths, and applies minimal writes
//!   and deletes
//! - **UpdateLoop**: drives the engine once, or continuously off the
//!   inventory's push-notification channel with debounced re-syncs
//!
//! # Architecture
//!
//! `spool-core` coordinates the leaf crates and is consumed by the CLI:
//!
//! ```text
//!                   spool-cli
//!                       |
//!                  spool-core
//!                       |
//!       +---------------+----------------+
//!       |               |                |
//!   spool-fs    spool-inventory   spool-templates
//! ```

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod summary;
pub mod update;

pub use cache::{CachedOutput, SlotKey, SourceId, SyncCache};
pub use config::{Slicer, SpoolSelection, SyncConfig};
pub use engine::ReconciliationEngine;
pub use error::{Error, Result};
pub use summary::{SyncIssue, SyncSummary};
pub use update::{LoopState, UpdateLoop};
