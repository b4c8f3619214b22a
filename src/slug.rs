//! Slug generation for entry identifiers.

use crate::defaults::MAX_ID_LEN;
use crate::error::{Error, Result};

/// Reduce arbitrary text to a filesystem- and identifier-safe slug.
///
/// Letters and digits are kept (lower-cased), spaces, hyphens, and
/// underscores become `-`, and everything else is dropped. Runs of `-`
/// collapse to one and the result is trimmed of leading and trailing
/// separators, then truncated to [`MAX_ID_LEN`] characters.
///
/// Returns an empty string when nothing survives.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    for ch in value.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            slug.push(ch);
        } else if matches!(ch, ' ' | '-' | '_') && !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let truncated: String = slug.chars().take(MAX_ID_LEN).collect();
    truncated.trim_matches('-').to_string()
}

/// Derive an entry id from a title.
///
/// Fails with [`Error::EmptySlug`] when the title has no usable characters.
pub fn entry_id(title: &str) -> Result<String> {
    let slug = slugify(title);
    if slug.is_empty() {
        return Err(Error::EmptySlug {
            title: title.to_string(),
        });
    }
    Ok(slug)
}
