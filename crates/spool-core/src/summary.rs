//! Sync outcome reporting

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One recorded per-record failure inside an otherwise completed sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncIssue {
    /// Filament the failure belongs to, when known
    pub filament: Option<i64>,
    /// Spool the failure belongs to, in per-spool modes
    pub spool: Option<i64>,
    /// Output path involved, when one was computed
    pub path: Option<PathBuf>,
    pub message: String,
}

/// Outcome of one sync cycle.
///
/// A sync that recorded issues still reports the files it did manage;
/// callers decide whether a partially failed cycle is fatal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub errors: Vec<SyncIssue>,
}

impl SyncSummary {
    /// Whether every record made it to disk.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of files this cycle actually touched.
    pub fn touched(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub(crate) fn record(&mut self, issue: SyncIssue) {
        tracing::warn!(
            filament = ?issue.filament,
            spool = ?issue.spool,
            path = ?issue.path,
            "{}",
            issue.message
        );
        self.errors.push(issue);
    }
}
