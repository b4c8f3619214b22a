//! A point-in-time view of every entry and release a command can see.
//!
//! The snapshot joins the pending pool, released entries, and (optionally)
//! every configured module into one universe. Identifier resolution and
//! listings work against it.

use std::collections::btree_map::{self, BTreeMap};

use crate::entry::{sort_descending, Entry};
use crate::error::Result;
use crate::index::ReleaseIndex;
use crate::project::Project;
use crate::release::ReleaseManifest;
use crate::resolve::{self, Resolution};

/// Entries and releases known at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Entries ordered oldest first; row 1 is the last element.
    pub ordered: Vec<Entry>,
    pub entries: BTreeMap<String, Entry>,
    /// Manifests of the project itself, keyed by version label.
    pub manifests: BTreeMap<String, ReleaseManifest>,
    /// Release index across the project and its modules.
    pub index: ReleaseIndex,
    /// Module id owning each module entry. Project entries are absent.
    pub owners: BTreeMap<String, String>,
    /// Id of the project the snapshot was gathered for.
    pub project_id: String,
}

impl Snapshot {
    /// Collect the universe for a project.
    ///
    /// Released entries are loaded leniently: a manifest listing a missing
    /// file only fails when that release is resolved.
    pub fn gather(project: &Project, include_modules: bool) -> Result<Self> {
        let mut snapshot = Snapshot {
            project_id: project.config().id.clone(),
            ..Default::default()
        };
        let manifests = collect(project, &mut snapshot.entries)?;
        snapshot.index = ReleaseIndex::build(&manifests);
        snapshot.manifests = manifests
            .into_iter()
            .map(|m| (m.version.clone(), m))
            .collect();

        if include_modules {
            for module in project.modules()? {
                let mut module_entries = BTreeMap::new();
                let module_manifests = collect(&module.project(), &mut module_entries)?;
                snapshot.index.merge(&ReleaseIndex::build(&module_manifests));
                for (id, entry) in module_entries {
                    // A parent entry with the same id shadows the module's.
                    if let btree_map::Entry::Vacant(slot) = snapshot.entries.entry(id) {
                        snapshot
                            .owners
                            .insert(slot.key().clone(), module.config.id.clone());
                        slot.insert(entry);
                    }
                }
            }
        }

        let mut ordered: Vec<Entry> = snapshot.entries.values().cloned().collect();
        sort_descending(&mut ordered);
        ordered.reverse();
        snapshot.ordered = ordered;
        Ok(snapshot)
    }

    /// Project an entry belongs to: its explicit `project`, else the module
    /// that owns it, else the snapshot's own project.
    pub fn project_of<'a>(&'a self, entry: &'a Entry) -> &'a str {
        entry
            .header
            .project
            .as_deref()
            .or_else(|| self.owners.get(&entry.id).map(String::as_str))
            .unwrap_or(&self.project_id)
    }

    /// Entries newest first, paired with their row numbers.
    pub fn rows(&self) -> impl Iterator<Item = (usize, &Entry)> {
        self.ordered
            .iter()
            .rev()
            .enumerate()
            .map(|(i, entry)| (i + 1, entry))
    }

    pub fn resolve(&self, token: &str) -> Result<Resolution> {
        resolve::resolve(token, &self.ordered, &self.entries, &self.manifests)
    }

    pub fn resolve_all<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<Resolution>> {
        resolve::resolve_all(tokens, &self.ordered, &self.entries, &self.manifests)
    }
}

/// Load pending and released entries of one project into `entries`.
/// Released entries replace pending ones with the same id.
fn collect(
    project: &Project,
    entries: &mut BTreeMap<String, Entry>,
) -> Result<Vec<ReleaseManifest>> {
    for entry in project.entries().list()? {
        entries.insert(entry.id.clone(), entry);
    }
    let store = project.releases();
    let manifests = store.list()?;
    for manifest in &manifests {
        for entry in store.load_entries_lenient(manifest)? {
            entries.insert(entry.id.clone(), entry);
        }
    }
    Ok(manifests)
}
