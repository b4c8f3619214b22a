//! # Error Suggestions
//!
//! Helper functions for generating error messages with hints. Errors should
//! tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shiplog::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Unknown entry type: {}", kind);
//!
//! // Use:
//! return Err(suggestions::unknown_kind(kind));
//! ```

use std::path::Path;

use crate::defaults::{CONFIG_FILENAME, PACKAGE_FILENAME, ROOT_ENV};
use crate::entry::EntryKind;
use crate::error::Error;

/// Generate an error for a project directory without configuration.
pub fn config_not_found(root: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "No changelog project found at {root}\n\n\
         hint: Create a {CONFIG_FILENAME} with at least an 'id' key\n\
         hint: Or place a {PACKAGE_FILENAME} in the parent directory\n\
         hint: Use --root or set {ROOT_ENV} to point at another project",
        root = root.display()
    )
}

/// Generate an error for an entry type outside the known set.
///
/// Suggests the closest known type when one is within a small edit
/// distance.
pub fn unknown_kind(kind: &str) -> anyhow::Error {
    let valid = EntryKind::names();
    let did_you_mean = find_similar(&kind.to_lowercase(), &valid)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Unknown entry type: {kind}{did_you_mean}\n\n\
         Valid types are: {types}",
        types = valid.join(", ")
    )
}

/// Generate an error for a release that does not exist.
pub fn release_not_found(version: &str, available: &[String]) -> anyhow::Error {
    let known: Vec<&str> = available.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(version, &known)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();
    let listing = if available.is_empty() {
        "hint: No releases exist yet; create one with 'shiplog release create'".to_string()
    } else {
        format!("hint: Known releases: {}", available.join(", "))
    };

    anyhow::anyhow!("Release '{version}' not found{did_you_mean}\n\n{listing}")
}

/// Generate an error for a command that needs at least one release.
pub fn no_releases() -> anyhow::Error {
    anyhow::anyhow!(
        "No releases found\n\n\
         hint: Create a release first with 'shiplog release create'"
    )
}

/// Generate an error for a mutating command blocked by validation errors.
pub fn validation_failed(action: &str, errors: usize) -> anyhow::Error {
    anyhow::anyhow!(
        "Cannot {action}: validation reported {errors} error(s)\n\n\
         hint: Run 'shiplog validate' to see the problems\n\
         hint: Fix or remove the offending files and try again"
    )
}

/// Convert a library error into a user-facing error, adding hints where the
/// library error alone is not enough.
///
/// The original error stays in the chain so `main` can still map it to an
/// exit code.
pub fn explain(error: Error) -> anyhow::Error {
    match &error {
        Error::InvalidKind { kind } => {
            let hinted = unknown_kind(kind);
            anyhow::Error::new(error).context(hinted.to_string())
        }
        _ => anyhow::Error::new(error),
    }
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];
    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
