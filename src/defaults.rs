//! Default names and limits shared across the library and the CLI.
//!
//! Every on-disk name used by a changelog project lives here so the stores,
//! validation, and commands agree on the layout.

/// Project configuration file inside a changelog root.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Fallback configuration file in the parent of a changelog root.
pub const PACKAGE_FILENAME: &str = "package.yaml";

/// Directory holding the pending pool.
pub const UNRELEASED_DIR: &str = "unreleased";

/// Directory holding one subdirectory per release.
pub const RELEASES_DIR: &str = "releases";

/// Manifest file inside a release directory.
pub const MANIFEST_FILENAME: &str = "manifest.yaml";

/// Rendered notes file inside a release directory.
pub const NOTES_FILENAME: &str = "notes.md";

/// Directory inside a release holding relocated entry files.
pub const RELEASE_ENTRIES_DIR: &str = "entries";

/// Extension of entry files.
pub const ENTRY_EXTENSION: &str = "md";

/// Maximum length of a generated entry id.
pub const MAX_ID_LEN: usize = 80;

/// Environment variable that overrides the project root.
pub const ROOT_ENV: &str = "SHIPLOG_ROOT";
