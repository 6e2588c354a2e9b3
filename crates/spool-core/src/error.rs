//! Error types for spool-core

use std::path::PathBuf;

/// Result type for spool-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in spool-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Two distinct records rendered the same output path
    #[error("Filename collision at {path}: filaments {first} and {second}")]
    Collision {
        path: PathBuf,
        first: i64,
        second: i64,
    },

    /// The push-notification channel hung up and will not reconnect
    #[error("Change subscription closed")]
    SubscriptionClosed,

    // Transparent wrappers for underlying crate errors
    /// Inventory error from spool-inventory
    #[error(transparent)]
    Inventory(#[from] spool_inventory::Error),

    /// Template error from spool-templates
    #[error(transparent)]
    Template(#[from] spool_templates::Error),

    /// Filesystem error from spool-fs
    #[error(transparent)]
    Fs(#[from] spool_fs::Error),
}
