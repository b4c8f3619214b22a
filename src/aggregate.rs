//! # Module Aggregation
//!
//! Computes, per module, the entries it released between two aggregation
//! checkpoints. A checkpoint is a map from module id to the module version
//! recorded in a parent manifest.
//!
//! For each module, a release counts when its version is strictly greater
//! than the previous checkpoint and not greater than the target checkpoint.
//! A missing or unparseable bound means "unbounded" on that side.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::entry::Entry;
use crate::error::Result;
use crate::modules::Module;
use crate::version::{self, VersionLabel};

/// Entries one module shipped in the requested window.
#[derive(Debug, Clone)]
pub struct ModuleDelta {
    pub config: Config,
    /// Greatest release version of the module, if any.
    pub current_version: Option<String>,
    /// Entries in release order (lower-cased title, then id).
    pub entries: Vec<Entry>,
}

/// Result of aggregating all modules.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Per-module deltas keyed by module id. Modules without entries in the
    /// window are omitted.
    pub deltas: BTreeMap<String, ModuleDelta>,
    /// Greatest release version of every module that has one.
    pub current_versions: BTreeMap<String, String>,
}

fn bound(versions: Option<&BTreeMap<String, String>>, id: &str) -> Option<VersionLabel> {
    versions
        .and_then(|map| map.get(id))
        .and_then(|label| VersionLabel::parse_lenient(label))
}

/// Gather the entries each module released after `previous` and up to
/// `target`.
///
/// Entries are loaded strictly: a module manifest that lists a missing file
/// fails the aggregation.
pub fn delta(
    modules: &[Module],
    previous: Option<&BTreeMap<String, String>>,
    target: Option<&BTreeMap<String, String>>,
) -> Result<Aggregation> {
    let mut aggregation = Aggregation::default();

    for module in modules {
        let id = module.config.id.clone();
        let releases = module.project().releases();
        let manifests = releases.list()?;

        let current = version::latest(manifests.iter().map(|m| m.version.as_str()));
        if let Some(current) = &current {
            aggregation
                .current_versions
                .insert(id.clone(), current.as_str().to_string());
        }

        let lower = bound(previous, &id);
        let upper = bound(target, &id);

        let mut entries = Vec::new();
        for manifest in &manifests {
            let Some(release_version) = VersionLabel::parse_lenient(&manifest.version) else {
                continue;
            };
            if lower
                .as_ref()
                .is_some_and(|lower| release_version.version() <= lower.version())
            {
                continue;
            }
            if upper
                .as_ref()
                .is_some_and(|upper| release_version.version() > upper.version())
            {
                continue;
            }
            entries.extend(releases.load_entries(manifest)?);
        }

        if entries.is_empty() {
            continue;
        }
        entries.sort_by(Entry::release_order);
        log::debug!("module {} contributes {} entries", id, entries.len());
        aggregation.deltas.insert(
            id,
            ModuleDelta {
                config: module.config.clone(),
                current_version: current.map(|c| c.as_str().to_string()),
                entries,
            },
        );
    }

    Ok(aggregation)
}
