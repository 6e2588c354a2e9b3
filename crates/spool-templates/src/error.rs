//! Error types for spool-templates

use std::path::PathBuf;

/// Result type for spool-templates operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur resolving or rendering templates
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The template directory could not be loaded at all
    #[error("Cannot load templates from {dir}: {message}")]
    Load { dir: PathBuf, message: String },

    /// None of the candidate template names exist
    #[error("No template found under {dir} (tried {tried:?})")]
    NotFound { dir: PathBuf, tried: Vec<String> },

    /// Rendering failed, typically because a variable the template requires
    /// is absent and carries no default
    #[error("Template {template} failed to render: {message}")]
    Render { template: String, message: String },

    /// A rendered filename cannot be used as a single path segment
    #[error("Rendered filename {rendered:?} is unusable: {reason}")]
    InvalidFilename { rendered: String, reason: String },

    /// The record could not be turned into a template namespace
    #[error("Failed to build render context: {message}")]
    Context { message: String },
}
