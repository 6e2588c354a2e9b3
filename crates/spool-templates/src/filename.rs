//! Output path construction
//!
//! The on-disk name of every generated file comes from the reserved
//! `filename.template` (or `filename_for_spool.template` in per-spool mode),
//! rendered against the same namespace as the content templates. The result
//! must be a single path segment; anything else is a configuration error,
//! not something to sanitize silently.

use std::path::{Path, PathBuf};

use crate::context::RenderContext;
use crate::resolver::TemplateResolver;
use crate::{Error, Result};

/// Builds output paths under one output directory.
pub struct FilenameBuilder {
    output_dir: PathBuf,
}

impl FilenameBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render `template` and join the result under the output directory.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] when the template does not exist,
    /// [`Error::Render`] when it fails to render, and
    /// [`Error::InvalidFilename`] when the rendered name is empty, contains
    /// a path separator, or is a traversal segment.
    pub fn build_path(
        &self,
        resolver: &TemplateResolver,
        template: &str,
        context: &RenderContext,
    ) -> Result<PathBuf> {
        let rendered = resolver.render(template, context)?;
        let name = rendered.trim();

        if name.is_empty() {
            return Err(Error::InvalidFilename {
                rendered,
                reason: "empty filename".to_string(),
            });
        }
        if name.contains('/') || name.contains('\\') {
            return Err(Error::InvalidFilename {
                rendered: name.to_string(),
                reason: "contains a path separator".to_string(),
            });
        }
        if name == "." || name == ".." {
            return Err(Error::InvalidFilename {
                rendered: name.to_string(),
                reason: "directory traversal segment".to_string(),
            });
        }

        Ok(self.output_dir.join(name))
    }
}
