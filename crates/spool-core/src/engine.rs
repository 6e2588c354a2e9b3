//! ReconciliationEngine implementation
//!
//! The engine owns the output directory and the render cache. Each `sync()`
//! recomputes the desired file set from a fresh inventory snapshot, diffs it
//! against what it knows it has written, and applies the minimal writes and
//! deletes. Failures on one record never stop the rest of the batch; only a
//! failed fetch aborts a cycle, because without data there is nothing to
//! reconcile against.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use spool_inventory::{FilamentRecord, Inventory, InventoryApi, SpoolRecord};
use spool_templates::{
    FILENAME_FOR_SPOOL_TEMPLATE, FILENAME_TEMPLATE, FilenameBuilder, RenderContext,
    TemplateResolver, ToolInfo,
};

use crate::cache::{CachedOutput, SlotKey, SourceId, SyncCache};
use crate::config::{SpoolSelection, SyncConfig};
use crate::summary::{SyncIssue, SyncSummary};
use crate::{Error, Result};

/// Tool identity exposed to templates in the reserved namespace.
const TOOL_NAME: &str = "spoolsync";

/// One record scheduled for rendering: a filament, optionally through the
/// lens of a selected spool.
struct RenderSource<'a> {
    filament: &'a FilamentRecord,
    spool: Option<&'a SpoolRecord>,
    source: SourceId,
}

/// A (path, rendered content) pair the output directory should contain.
struct DesiredFile {
    slot: SlotKey,
    filament_id: i64,
    spool_id: Option<i64>,
    path: PathBuf,
    content: String,
    digest: String,
}

/// Reconciles the on-disk config set with the inventory.
pub struct ReconciliationEngine<C> {
    config: SyncConfig,
    client: C,
    resolver: TemplateResolver,
    filenames: FilenameBuilder,
    tool: ToolInfo,
    cache: SyncCache,
}

impl<C: InventoryApi> ReconciliationEngine<C> {
    /// Create an engine, compiling the slicer's template directory.
    pub fn new(config: SyncConfig, client: C) -> Result<Self> {
        let resolver = TemplateResolver::new(config.template_dir())?;
        let filenames = FilenameBuilder::new(&config.output_dir);
        let tool = ToolInfo {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            inventory_url: config.inventory_url.clone(),
        };
        Ok(Self {
            config,
            client,
            resolver,
            filenames,
            tool,
            cache: SyncCache::default(),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one reconciliation cycle.
    ///
    /// # Errors
    ///
    /// Only fetch failures abort the cycle. Everything downstream — template
    /// lookups, renders, filenames, file I/O — is recorded per record in the
    /// returned [`SyncSummary`] and processing continues.
    pub async fn sync(&mut self) -> Result<SyncSummary> {
        let inventory = self.client.fetch_inventory().await?;
        let mut summary = SyncSummary::default();

        let (desired, mut next_cache) = self.compute_desired(&inventory, &mut summary);

        if self.config.delete_all {
            self.sweep_output_dir(&mut summary)?;
            self.cache.clear();
        }

        self.apply_writes(&desired, &mut next_cache, &mut summary);

        if !self.config.delete_all && !self.config.additive_only {
            self.apply_deletes(&desired, &next_cache, &mut summary);
        }

        self.cache.replace(next_cache);
        tracing::info!(
            created = summary.created,
            updated = summary.updated,
            deleted = summary.deleted,
            unchanged = summary.unchanged,
            errors = summary.errors.len(),
            "sync cycle complete"
        );
        Ok(summary)
    }

    /// Compute the desired file set and the cache entries carried forward
    /// for records that failed this cycle (their old files stay untouched).
    fn compute_desired(
        &self,
        inventory: &Inventory,
        summary: &mut SyncSummary,
    ) -> (BTreeMap<PathBuf, DesiredFile>, HashMap<SlotKey, CachedOutput>) {
        let mut desired: BTreeMap<PathBuf, DesiredFile> = BTreeMap::new();
        // First claimant of each path, kept even after a collision evicts
        // the entry, so a third claimant still collides.
        let mut claimed: HashMap<PathBuf, i64> = HashMap::new();
        let mut carried: HashMap<SlotKey, CachedOutput> = HashMap::new();

        let variants = self.config.variant_passes();
        let filename_template = match self.config.per_spool {
            Some(SpoolSelection::All) => FILENAME_FOR_SPOOL_TEMPLATE,
            _ => FILENAME_TEMPLATE,
        };

        for source in self.enumerate(inventory) {
            for suffix in self.config.slicer.suffixes() {
                for variant in &variants {
                    let slot = SlotKey {
                        source: source.source,
                        suffix: (*suffix).to_string(),
                        variant: variant.clone(),
                    };
                    match self.render_one(&source, filename_template, suffix, variant, &slot) {
                        Ok(file) => {
                            if let Some(&first) = claimed.get(&file.path) {
                                let error = Error::Collision {
                                    path: file.path.clone(),
                                    first,
                                    second: file.filament_id,
                                };
                                summary.record(SyncIssue {
                                    filament: Some(file.filament_id),
                                    spool: file.spool_id,
                                    path: Some(file.path.clone()),
                                    message: error.to_string(),
                                });
                                if let Some(evicted) = desired.remove(&file.path) {
                                    self.carry_forward(&evicted.slot, &mut carried);
                                }
                                self.carry_forward(&slot, &mut carried);
                            } else {
                                claimed.insert(file.path.clone(), file.filament_id);
                                desired.insert(file.path.clone(), file);
                            }
                        }
                        Err(error) => {
                            summary.record(SyncIssue {
                                filament: Some(source.filament.id),
                                spool: source.spool.map(|s| s.id),
                                path: None,
                                message: error.to_string(),
                            });
                            self.carry_forward(&slot, &mut carried);
                        }
                    }
                }
            }
        }

        (desired, carried)
    }

    /// Render one (source, suffix, variant) slot into a desired file.
    fn render_one(
        &self,
        source: &RenderSource<'_>,
        filename_template: &str,
        suffix: &str,
        variant: &str,
        slot: &SlotKey,
    ) -> Result<DesiredFile> {
        let context =
            RenderContext::build(source.filament, source.spool, &self.tool, suffix, variant)?;
        let template = self
            .resolver
            .resolve(source.filament.material.as_deref(), suffix)?;
        let content = self.resolver.render(&template, &context)?;
        let path = self
            .filenames
            .build_path(&self.resolver, filename_template, &context)?;
        let digest = spool_fs::content_digest(&content);
        Ok(DesiredFile {
            slot: slot.clone(),
            filament_id: source.filament.id,
            spool_id: source.spool.map(|s| s.id),
            path,
            content,
            digest,
        })
    }

    /// The records to render this cycle, per the configured mode.
    fn enumerate<'a>(&self, inventory: &'a Inventory) -> Vec<RenderSource<'a>> {
        match self.config.per_spool {
            None => inventory
                .active_filaments()
                .into_iter()
                .map(|filament| RenderSource {
                    filament,
                    spool: None,
                    source: SourceId::Filament(filament.id),
                })
                .collect(),
            Some(SpoolSelection::All) => inventory
                .active_spools()
                .filter_map(|spool| {
                    spool.filament.as_ref().map(|filament| RenderSource {
                        filament,
                        spool: Some(spool),
                        source: SourceId::Spool(spool.id),
                    })
                })
                .collect(),
            Some(SpoolSelection::LeastLeft) => self.selected_spool_sources(inventory, least_left),
            Some(SpoolSelection::MostRecent) => {
                self.selected_spool_sources(inventory, most_recent)
            }
        }
    }

    /// One source per filament, through the spool `pick` chooses.
    fn selected_spool_sources<'a>(
        &self,
        inventory: &'a Inventory,
        pick: for<'s> fn(&[&'s SpoolRecord]) -> Option<&'s SpoolRecord>,
    ) -> Vec<RenderSource<'a>> {
        let mut grouped: BTreeMap<i64, Vec<&SpoolRecord>> = BTreeMap::new();
        for spool in inventory.active_spools() {
            if let Some(id) = spool.filament_ref() {
                grouped.entry(id).or_default().push(spool);
            }
        }
        grouped
            .values()
            .filter_map(|spools| pick(spools))
            .filter_map(|spool| {
                spool.filament.as_ref().map(|filament| RenderSource {
                    filament,
                    spool: Some(spool),
                    source: SourceId::Filament(filament.id),
                })
            })
            .collect()
    }

    /// Remove every suffix-matched file in the output directory.
    fn sweep_output_dir(&self, summary: &mut SyncSummary) -> Result<()> {
        let files = spool_fs::list_files_with_suffixes(
            &self.config.output_dir,
            self.config.slicer.suffixes(),
        )?;
        for path in files {
            match spool_fs::remove_file(&path) {
                Ok(()) => summary.deleted += 1,
                Err(error) => summary.record(SyncIssue {
                    filament: None,
                    spool: None,
                    path: Some(path),
                    message: error.to_string(),
                }),
            }
        }
        Ok(())
    }

    /// Write every desired file whose content differs from what is there.
    fn apply_writes(
        &self,
        desired: &BTreeMap<PathBuf, DesiredFile>,
        next_cache: &mut HashMap<SlotKey, CachedOutput>,
        summary: &mut SyncSummary,
    ) {
        for file in desired.values() {
            let on_disk = file.path.exists();
            let unchanged = match self.cache.get(&file.slot) {
                Some(old) => on_disk && old.path == file.path && old.digest == file.digest,
                // Cold cache: fall back to hashing the file itself.
                None => {
                    on_disk
                        && spool_fs::file_digest(&file.path)
                            .map(|d| d == file.digest)
                            .unwrap_or(false)
                }
            };

            if unchanged {
                tracing::debug!(path = %file.path.display(), "content unchanged");
                summary.unchanged += 1;
                next_cache.insert(
                    file.slot.clone(),
                    CachedOutput {
                        path: file.path.clone(),
                        digest: file.digest.clone(),
                    },
                );
                continue;
            }

            match spool_fs::write_atomic(&file.path, file.content.as_bytes()) {
                Ok(()) => {
                    tracing::info!(path = %file.path.display(), "wrote config");
                    if on_disk {
                        summary.updated += 1;
                    } else {
                        summary.created += 1;
                    }
                    next_cache.insert(
                        file.slot.clone(),
                        CachedOutput {
                            path: file.path.clone(),
                            digest: file.digest.clone(),
                        },
                    );
                }
                Err(error) => {
                    summary.record(SyncIssue {
                        filament: Some(file.filament_id),
                        spool: file.spool_id,
                        path: Some(file.path.clone()),
                        message: error.to_string(),
                    });
                    // Keep the slot's previous file out of the delete set.
                    self.carry_forward(&file.slot, next_cache);
                }
            }
        }
    }

    /// Remove managed paths the desired set no longer contains.
    fn apply_deletes(
        &self,
        desired: &BTreeMap<PathBuf, DesiredFile>,
        next_cache: &HashMap<SlotKey, CachedOutput>,
        summary: &mut SyncSummary,
    ) {
        let protected: HashSet<&PathBuf> = desired
            .keys()
            .chain(next_cache.values().map(|e| &e.path))
            .collect();
        let mut stale: Vec<PathBuf> = self
            .cache
            .managed_paths()
            .into_iter()
            .filter(|path| !protected.contains(path))
            .collect();
        stale.sort();

        for path in stale {
            if !path.exists() {
                tracing::debug!(path = %path.display(), "managed path already gone");
                continue;
            }
            match spool_fs::remove_file(&path) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "deleted stale config");
                    summary.deleted += 1;
                }
                Err(error) => summary.record(SyncIssue {
                    filament: None,
                    spool: None,
                    path: Some(path),
                    message: error.to_string(),
                }),
            }
        }
    }

    fn carry_forward(&self, slot: &SlotKey, into: &mut HashMap<SlotKey, CachedOutput>) {
        if let Some(old) = self.cache.get(slot) {
            into.insert(slot.clone(), old.clone());
        }
    }
}

/// The spool with the least filament left; missing weights sort last,
/// ties break to the lowest spool id.
fn least_left<'s>(spools: &[&'s SpoolRecord]) -> Option<&'s SpoolRecord> {
    spools.iter().copied().min_by(|a, b| {
        let left_a = a.remaining_weight.unwrap_or(f64::INFINITY);
        let left_b = b.remaining_weight.unwrap_or(f64::INFINITY);
        left_a.total_cmp(&left_b).then(a.id.cmp(&b.id))
    })
}

/// The most recently used spool; never-used spools sort first, ties break
/// to the lowest spool id.
fn most_recent<'s>(spools: &[&'s SpoolRecord]) -> Option<&'s SpoolRecord> {
    spools
        .iter()
        .copied()
        .max_by(|a, b| a.last_used.cmp(&b.last_used).then(b.id.cmp(&a.id)))
}
