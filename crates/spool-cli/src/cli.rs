//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use spool_core::{Slicer, SpoolSelection};

/// Fetches data from a Spoolman-compatible inventory and creates slicer
/// filament config files.
#[derive(Parser, Debug)]
#[command(name = "spoolsync")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
pub struct Cli {
    /// The slicer's filament config dir
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dir: PathBuf,

    /// The slicer to generate configs for
    #[arg(short, long, value_enum, default_value = "superslicer")]
    pub slicer: SlicerArg,

    /// URL of the inventory service
    #[arg(short, long, default_value = "http://localhost:7912", value_name = "URL")]
    pub url: String,

    /// Keep running and update configs when the inventory changes
    #[arg(short = 'U', long)]
    pub updates: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Write one config set per variant value
    #[arg(
        short = 'V',
        long,
        value_name = "VALUE1,VALUE2..",
        value_delimiter = ','
    )]
    pub variants: Vec<String>,

    /// Delete all filament configs before writing the current ones
    #[arg(short = 'D', long)]
    pub delete_all: bool,

    /// Never delete configs, only create and update them
    #[arg(long, conflicts_with = "delete_all")]
    pub additive_only: bool,

    /// Create one config per spool instead of per filament.
    ///
    /// 'all': one file per spool. 'least-left': one file per filament for
    /// the spool with the least filament left. 'most-recent': one file per
    /// filament for the most recently used spool.
    #[arg(long, value_enum, value_name = "MODE")]
    pub create_per_spool: Option<PerSpoolArg>,

    /// Template root directory (default: the user config dir)
    #[arg(short = 't', long, value_name = "DIR")]
    pub template_dir: Option<PathBuf>,
}

impl Cli {
    pub fn slicer(&self) -> Slicer {
        match self.slicer {
            SlicerArg::Slic3r => Slicer::Slic3r,
            SlicerArg::Prusaslicer => Slicer::PrusaSlicer,
            SlicerArg::Superslicer => Slicer::SuperSlicer,
            SlicerArg::Orcaslicer => Slicer::OrcaSlicer,
        }
    }

    pub fn per_spool(&self) -> Option<SpoolSelection> {
        self.create_per_spool.map(|mode| match mode {
            PerSpoolArg::All => SpoolSelection::All,
            PerSpoolArg::LeastLeft => SpoolSelection::LeastLeft,
            PerSpoolArg::MostRecent => SpoolSelection::MostRecent,
        })
    }

    /// The template root: explicit flag, or `spoolsync/` in the user's
    /// config directory.
    pub fn template_root(&self) -> PathBuf {
        self.template_dir.clone().unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("spoolsync")
        })
    }
}

/// Slicer choice as it appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SlicerArg {
    Slic3r,
    Prusaslicer,
    Superslicer,
    Orcaslicer,
}

/// Per-spool mode as it appears on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PerSpoolArg {
    All,
    LeastLeft,
    MostRecent,
}
