//! Template directory builders

use std::path::Path;

use tempfile::TempDir;

/// A temporary template root containing one slicer's template directory.
pub struct TemplateDir {
    root: TempDir,
    slicer_dir: String,
}

impl TemplateDir {
    /// Create a template root with an empty `templates-<slicer>` directory.
    pub fn new(slicer: &str) -> Self {
        let root = TempDir::new().unwrap();
        let slicer_dir = format!("templates-{slicer}");
        std::fs::create_dir(root.path().join(&slicer_dir)).unwrap();
        Self { root, slicer_dir }
    }

    /// Write one template file into the slicer directory.
    pub fn write(&self, name: &str, content: &str) -> &Self {
        std::fs::write(self.root.path().join(&self.slicer_dir).join(name), content).unwrap();
        self
    }

    /// The template root (parent of `templates-<slicer>`).
    pub fn root(&self) -> &Path {
        self.root.path()
    }
}

/// A superslicer template root with a filename template and a default
/// content template, enough for most engine scenarios.
pub fn superslicer_defaults() -> TemplateDir {
    let dir = TemplateDir::new("superslicer");
    dir.write(
        "filename.template",
        "{{ name }}{% if spoolsync.variant %}-{{ spoolsync.variant }}{% endif %}.{{ spoolsync.slicer_suffix }}",
    );
    dir.write(
        "default.ini.template",
        "material={{ material }}\ntemp={{ settings_extruder_temp }}\n",
    );
    dir
}
