//! Template lookup and rendering

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::RenderContext;
use crate::{Error, Result};

/// Common suffix of every template file.
pub const TEMPLATE_SUFFIX: &str = ".template";
/// Stem of the per-suffix fallback template.
pub const DEFAULT_STEM: &str = "default";
/// Reserved template that renders the output filename.
pub const FILENAME_TEMPLATE: &str = "filename.template";
/// Reserved filename template used when emitting one file per spool.
pub const FILENAME_FOR_SPOOL_TEMPLATE: &str = "filename_for_spool.template";

/// Compiled view of one slicer's template directory.
///
/// All `*.template` files are compiled once at construction; lookups and
/// renders afterwards touch no disk, so a sync cycle sees one consistent
/// template set.
pub struct TemplateResolver {
    dir: PathBuf,
    tera: Tera,
    names: HashSet<String>,
}

impl TemplateResolver {
    /// Compile every `*.template` file in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let pattern = format!("{}/*{}", dir.display(), TEMPLATE_SUFFIX);
        let tera = Tera::new(&pattern).map_err(|e| Error::Load {
            dir: dir.clone(),
            message: e.to_string(),
        })?;
        let names: HashSet<String> = tera.get_template_names().map(String::from).collect();
        tracing::debug!(dir = %dir.display(), templates = names.len(), "templates compiled");
        Ok(Self { dir, tera, names })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Template name for a material and output suffix.
    ///
    /// Prefers `<material>.<suffix>.template`, falling back to
    /// `default.<suffix>.template`.
    pub fn resolve(&self, material: Option<&str>, suffix: &str) -> Result<String> {
        let mut tried = Vec::new();
        if let Some(material) = material {
            let name = format!("{material}.{suffix}{TEMPLATE_SUFFIX}");
            if self.names.contains(&name) {
                return Ok(name);
            }
            tracing::debug!(material, suffix, "no material template, trying default");
            tried.push(name);
        }
        let default = format!("{DEFAULT_STEM}.{suffix}{TEMPLATE_SUFFIX}");
        if self.names.contains(&default) {
            return Ok(default);
        }
        tried.push(default);
        Err(Error::NotFound {
            dir: self.dir.clone(),
            tried,
        })
    }

    /// Render a compiled template against a context.
    ///
    /// Output is byte-identical for equal contexts: the compiled template set
    /// is fixed and the context is built from sorted JSON maps.
    pub fn render(&self, name: &str, context: &RenderContext) -> Result<String> {
        if !self.names.contains(name) {
            return Err(Error::NotFound {
                dir: self.dir.clone(),
                tried: vec![name.to_string()],
            });
        }
        self.tera
            .render(name, context.tera())
            .map_err(|e| Error::Render {
                template: name.to_string(),
                message: flatten_error(&e),
            })
    }
}

/// Tera buries the interesting cause ("Variable `x` not found …") in the
/// source chain; collect the whole chain into one message.
fn flatten_error(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
