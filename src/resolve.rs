//! # Identifier Resolution
//!
//! Maps a free-form token to entries. Tokens are tried in this order:
//!
//! 1. **Row number**: an integer `r` selects row `r` of the entry table, where
//!    row 1 is the newest entry. Rows outside `1..=N` are rejected with the
//!    valid range.
//! 2. **Release**: a token starting with `v` or `V` names a release exactly.
//!    Every id the manifest lists must resolve to an entry. Ids starting
//!    with `v` are still reachable by row or by a later fragment.
//! 3. **Entry id**: an exact id match, otherwise the unique id containing the
//!    token. Several candidates are an error listing all of them; the
//!    resolver never picks one.
//!
//! Resolution is a pure function of the token and the snapshot.

use std::collections::BTreeMap;

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::release::ReleaseManifest;

/// Which rule resolved a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionKind {
    Row,
    Entry,
    Release,
}

/// The outcome of resolving one token.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub kind: ResolutionKind,
    /// The trimmed token.
    pub token: String,
    pub entries: Vec<Entry>,
    /// The release, for release tokens.
    pub manifest: Option<ReleaseManifest>,
}

fn looks_like_release(token: &str) -> bool {
    token.starts_with(['v', 'V'])
}

/// Resolve a single token.
///
/// `ordered` holds entries oldest first, so row `r` is `ordered[N - r]`.
pub fn resolve(
    token: &str,
    ordered: &[Entry],
    by_id: &BTreeMap<String, Entry>,
    manifests: &BTreeMap<String, ReleaseManifest>,
) -> Result<Resolution> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::EmptyIdentifier);
    }

    if let Ok(row) = token.parse::<i64>() {
        let max = ordered.len();
        let index = usize::try_from(row)
            .ok()
            .filter(|r| (1..=max).contains(r))
            .map(|r| max - r)
            .ok_or(Error::RowOutOfRange { row, max })?;
        return Ok(Resolution {
            kind: ResolutionKind::Row,
            token: token.to_string(),
            entries: vec![ordered[index].clone()],
            manifest: None,
        });
    }

    if looks_like_release(token) {
        let manifest = manifests.get(token).ok_or_else(|| Error::UnknownRelease {
            version: token.to_string(),
        })?;
        let missing: Vec<String> = manifest
            .entries
            .iter()
            .filter(|id| !by_id.contains_key(*id))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(Error::CorruptManifest {
                version: manifest.version.clone(),
                missing,
            });
        }
        let entries = manifest
            .entries
            .iter()
            .filter_map(|id| by_id.get(id).cloned())
            .collect();
        return Ok(Resolution {
            kind: ResolutionKind::Release,
            token: token.to_string(),
            entries,
            manifest: Some(manifest.clone()),
        });
    }

    if let Some(entry) = by_id.get(token) {
        return Ok(Resolution {
            kind: ResolutionKind::Entry,
            token: token.to_string(),
            entries: vec![entry.clone()],
            manifest: None,
        });
    }

    let candidates: Vec<&String> = by_id.keys().filter(|id| id.contains(token)).collect();
    match candidates.as_slice() {
        [] => Err(Error::NoMatch {
            token: token.to_string(),
        }),
        [id] => Ok(Resolution {
            kind: ResolutionKind::Entry,
            token: token.to_string(),
            entries: by_id.get(*id).cloned().into_iter().collect(),
            manifest: None,
        }),
        _ => Err(Error::AmbiguousMatch {
            token: token.to_string(),
            candidates: candidates.into_iter().cloned().collect(),
        }),
    }
}

/// Resolve several tokens independently, in input order.
pub fn resolve_all<S: AsRef<str>>(
    tokens: &[S],
    ordered: &[Entry],
    by_id: &BTreeMap<String, Entry>,
    manifests: &BTreeMap<String, ReleaseManifest>,
) -> Result<Vec<Resolution>> {
    tokens
        .iter()
        .map(|token| resolve(token.as_ref(), ordered, by_id, manifests))
        .collect()
}
