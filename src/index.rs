//! Entry id to release versions index.
//!
//! The index is derived from manifests on demand and never stored. Version
//! lists are sorted by their raw label text, so `v10.0.0` sorts before
//! `v2.0.0`.

use std::collections::BTreeMap;

use crate::release::ReleaseManifest;

/// Map from entry id to the version labels of the releases that list it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseIndex {
    versions: BTreeMap<String, Vec<String>>,
}

impl ReleaseIndex {
    /// Build the index from any number of manifests.
    pub fn build<'a, I>(manifests: I) -> Self
    where
        I: IntoIterator<Item = &'a ReleaseManifest>,
    {
        let mut index = Self::default();
        for manifest in manifests {
            index.add(manifest);
        }
        index.finish();
        index
    }

    fn add(&mut self, manifest: &ReleaseManifest) {
        for id in &manifest.entries {
            let versions = self.versions.entry(id.clone()).or_default();
            if !versions.contains(&manifest.version) {
                versions.push(manifest.version.clone());
            }
        }
    }

    fn finish(&mut self) {
        for versions in self.versions.values_mut() {
            versions.sort();
        }
    }

    /// Merge another index into this one.
    pub fn merge(&mut self, other: &ReleaseIndex) {
        for (id, versions) in &other.versions {
            let target = self.versions.entry(id.clone()).or_default();
            for version in versions {
                if !target.contains(version) {
                    target.push(version.clone());
                }
            }
        }
        self.finish();
    }

    /// Versions that include the entry, or an empty slice.
    pub fn versions(&self, id: &str) -> &[String] {
        self.versions.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.versions.contains_key(id)
    }

    /// Ids listed by more than one release.
    pub fn shared_ids(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.versions
            .iter()
            .filter(|(_, versions)| versions.len() > 1)
            .map(|(id, versions)| (id.as_str(), versions.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
