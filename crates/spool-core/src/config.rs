//! Engine configuration

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Slicer families this tool can generate configs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slicer {
    Slic3r,
    PrusaSlicer,
    SuperSlicer,
    OrcaSlicer,
}

impl Slicer {
    /// Config file suffixes this slicer expects, without the dot.
    pub fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Slicer::Slic3r | Slicer::PrusaSlicer | Slicer::SuperSlicer => &["ini"],
            Slicer::OrcaSlicer => &["json", "info"],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Slicer::Slic3r => "slic3r",
            Slicer::PrusaSlicer => "prusaslicer",
            Slicer::SuperSlicer => "superslicer",
            Slicer::OrcaSlicer => "orcaslicer",
        }
    }

    /// Directory under the template root holding this slicer's templates.
    pub fn template_dir_name(&self) -> String {
        format!("templates-{}", self.as_str())
    }
}

impl fmt::Display for Slicer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slicer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "slic3r" => Ok(Slicer::Slic3r),
            "prusaslicer" => Ok(Slicer::PrusaSlicer),
            "superslicer" => Ok(Slicer::SuperSlicer),
            "orcaslicer" => Ok(Slicer::OrcaSlicer),
            other => Err(format!("unsupported slicer: {other}")),
        }
    }
}

/// How to pick spools in per-spool mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpoolSelection {
    /// One config per active spool
    All,
    /// Per filament, the spool with the least remaining weight
    LeastLeft,
    /// Per filament, the most recently used spool
    MostRecent,
}

impl fmt::Display for SpoolSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SpoolSelection::All => "all",
            SpoolSelection::LeastLeft => "least-left",
            SpoolSelection::MostRecent => "most-recent",
        })
    }
}

impl FromStr for SpoolSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(SpoolSelection::All),
            "least-left" => Ok(SpoolSelection::LeastLeft),
            "most-recent" => Ok(SpoolSelection::MostRecent),
            other => Err(format!("unsupported per-spool mode: {other}")),
        }
    }
}

/// Everything one engine instance needs to know.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Directory the slicer reads filament configs from
    pub output_dir: PathBuf,
    pub slicer: Slicer,
    /// Base URL of the inventory service
    pub inventory_url: String,
    /// Parent of the `templates-<slicer>` directories
    pub template_root: PathBuf,
    /// Opaque variant labels; one output set per (record, variant) pair
    pub variants: Vec<String>,
    /// Sweep the output directory before writing
    pub delete_all: bool,
    /// Never delete, only create and update
    pub additive_only: bool,
    /// One config per selected spool instead of per filament
    pub per_spool: Option<SpoolSelection>,
}

impl SyncConfig {
    /// The variant labels to expand each record over. Always non-empty: no
    /// declared variants means one unvaried pass with an empty label.
    pub fn variant_passes(&self) -> Vec<String> {
        if self.variants.is_empty() {
            vec![String::new()]
        } else {
            self.variants.iter().map(|v| v.trim().to_string()).collect()
        }
    }

    /// Path of the slicer's template directory.
    pub fn template_dir(&self) -> PathBuf {
        self.template_root.join(self.slicer.template_dir_name())
    }
}
