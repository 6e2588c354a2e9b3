//! Error types for spool-cli

use std::path::PathBuf;

/// Result type for spool-cli operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced directly to the user
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The output dir {path:?} doesn't exist")]
    MissingOutputDir { path: PathBuf },

    #[error("No templates found in {path:?}")]
    MissingTemplates { path: PathBuf },

    #[error(transparent)]
    Core(#[from] spool_core::Error),
}

impl From<spool_inventory::Error> for Error {
    fn from(err: spool_inventory::Error) -> Self {
        Error::Core(spool_core::Error::Inventory(err))
    }
}
