//! # Skin Catalog Scanner
//!
//! Walks a skins root directory and classifies each subdirectory's
//! descriptor by declared controller family.
//!
//! The scanner is a pure function from root path to catalog value: callers
//! own the result and rescan by calling again, which replaces the catalog
//! wholesale rather than merging into stale state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::mapping::ControllerFamily;

use super::descriptor::SkinDescriptor;

/// One discovered (family, skin) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub family: ControllerFamily,
    pub skin_name: String,
    pub skin_path: PathBuf,
    pub author: String,
}

/// Skins discovered under a root directory, grouped by controller family.
///
/// Immutable after construction; a rescan produces a fresh value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    by_family: HashMap<ControllerFamily, Vec<CatalogEntry>>,
}

impl Catalog {
    /// Entries for one family, sorted by skin name
    pub fn skins_for(&self, family: ControllerFamily) -> &[CatalogEntry] {
        self.by_family
            .get(&family)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Families with at least one discovered skin, in display order
    pub fn families(&self) -> Vec<ControllerFamily> {
        ControllerFamily::ALL
            .iter()
            .copied()
            .filter(|family| !self.skins_for(*family).is_empty())
            .collect()
    }

    /// Look up one entry by family and skin name
    pub fn find(&self, family: ControllerFamily, skin_name: &str) -> Option<&CatalogEntry> {
        self.skins_for(family)
            .iter()
            .find(|entry| entry.skin_name == skin_name)
    }

    /// True when no skin was discovered for any family
    pub fn is_empty(&self) -> bool {
        self.by_family.values().all(Vec::is_empty)
    }

    /// Total number of (family, skin) entries
    pub fn len(&self) -> usize {
        self.by_family.values().map(Vec::len).sum()
    }
}

/// Scan `root` for skin directories and build a catalog.
///
/// Each immediate subdirectory is probed in catalog mode; directories
/// without a valid descriptor are excluded with a debug log, duplicate skin
/// names within one family are excluded with a warning. An inaccessible
/// root yields an empty catalog, not an error.
///
/// # Arguments
///
/// * `root` - Skins root directory (one skin per subdirectory)
///
/// # Examples
///
/// ```no_run
/// use padview::mapping::ControllerFamily;
/// use padview::skin::scan_skins;
///
/// let catalog = scan_skins("./skins".as_ref());
/// for entry in catalog.skins_for(ControllerFamily::N64) {
///     println!("{} by {}", entry.skin_name, entry.author);
/// }
/// ```
pub fn scan_skins(root: &Path) -> Catalog {
    let mut catalog = Catalog::default();

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot read skins root {}: {e}", root.display());
            return catalog;
        }
    };

    // Sort for a deterministic catalog when names collide
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        let summary = match SkinDescriptor::probe(&dir) {
            Ok(summary) => summary,
            Err(e) => {
                debug!("excluding {}: {e}", dir.display());
                continue;
            }
        };

        for family in summary.families {
            let skins = catalog.by_family.entry(family).or_default();
            if skins.iter().any(|entry| entry.skin_name == summary.name) {
                warn!(
                    "duplicate {family} skin name '{}' at {}, keeping the first",
                    summary.name,
                    dir.display()
                );
                continue;
            }
            skins.push(CatalogEntry {
                family,
                skin_name: summary.name.clone(),
                skin_path: dir.clone(),
                author: summary.author.clone(),
            });
        }
    }

    for skins in catalog.by_family.values_mut() {
        skins.sort_by(|a, b| a.skin_name.cmp(&b.skin_name));
    }

    debug!(entries = catalog.len(), "skin catalog scanned");
    catalog
}
