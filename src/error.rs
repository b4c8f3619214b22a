//! # Error Handling
//!
//! This module defines the centralized error type for the `shiplog` library.
//! It uses the `thiserror` library to create a single `Error` enum that covers
//! every failure mode of the entry store, the release manifest store, module
//! discovery, identifier resolution, and external tool invocation.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum. Each variant carries enough context for a
//!   user to correct their input or locate the damaged file.
//!
//! - **`ErrorCategory`**: Groups variants into the four classes the command
//!   layer cares about:
//!   - user input errors (bad identifiers, malformed versions, duplicate ids),
//!   - data integrity errors (manifests referencing missing files),
//!   - external tool errors (`git` or `gh` missing or failing),
//!   - plain I/O errors.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! No operation in the library retries on error. The command layer translates
//! an error into a process exit code through [`Error::exit_code`].

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for shiplog operations
#[derive(Error, Debug)]
pub enum Error {
    /// An entry kind outside the closed set of known kinds.
    #[error("Unknown entry type '{kind}'. Expected one of: breaking, feature, bugfix, change")]
    InvalidKind { kind: String },

    /// Project metadata that names more than one project.
    #[error("'{key}' must contain a single project, got: {}", projects.join(", "))]
    AmbiguousProject { key: String, projects: Vec<String> },

    /// A project other than the one the entry is created in.
    #[error("Unknown project '{project}'. Expected '{expected}'")]
    UnknownProject { project: String, expected: String },

    /// A component that the project configuration does not allow.
    #[error("Unknown component '{component}'. Allowed components: {}", allowed.join(", "))]
    InvalidComponent {
        component: String,
        allowed: Vec<String>,
    },

    /// An entry id that is already taken in the pending pool or a release.
    #[error("An entry with id '{id}' already exists at {}\n  hint: use a different title to generate a unique entry id", path.display())]
    DuplicateEntryId { id: String, path: PathBuf },

    /// A title that slugifies to nothing.
    #[error("Cannot generate entry id: title '{title}' produces an empty slug")]
    EmptySlug { title: String },

    /// An entry file that could not be parsed.
    #[error("Failed to read entry {}: {message}", path.display())]
    EntryParse { path: PathBuf, message: String },

    /// A release manifest that could not be parsed.
    #[error("Failed to read release manifest {}: {message}", path.display())]
    ManifestParse { path: PathBuf, message: String },

    /// A version label that does not parse as a version.
    #[error("Invalid version '{label}': {message}\n  hint: use a semantic version such as 1.2.3 or v1.2.3")]
    InvalidVersion { label: String, message: String },

    /// Conflicting or incomplete command options.
    #[error("{message}")]
    Usage { message: String },

    /// Promotion found neither entries nor an intro.
    #[error("No changelog entries available for release '{version}'\n  hint: provide an intro to create an intro-only release")]
    NoUnusedEntries { version: String },

    /// A bump computed a label that already has a manifest.
    #[error("Release '{version}' already exists\n  hint: supply a different bump or an explicit version")]
    VersionConflict { version: String },

    /// A bump was requested but no prior release exists.
    #[error("Cannot compute a {bump} release: no existing release to bump from\n  hint: pass an explicit version for the first release")]
    MissingBaseline { bump: String },

    /// A manifest lists entries whose files are absent.
    #[error("Release '{version}' is missing entry files for: {}", missing.join(", "))]
    CorruptManifest {
        version: String,
        missing: Vec<String>,
    },

    /// Moving an entry file into a release failed.
    #[error("Cannot move entry '{id}' into release '{version}': {message}")]
    RelocationFailed {
        id: String,
        version: String,
        message: String,
    },

    /// An identifier token that is empty after trimming.
    #[error("Identifier cannot be empty")]
    EmptyIdentifier,

    /// A row number outside of the current entry table.
    #[error("Row number {row} is out of range. Valid range: 1-{max}")]
    RowOutOfRange { row: i64, max: usize },

    /// A release token with no matching manifest.
    #[error("Release '{version}' not found")]
    UnknownRelease { version: String },

    /// A token that matches no entry id.
    #[error("No entry found matching '{token}'")]
    NoMatch { token: String },

    /// A token that matches more than one entry id.
    #[error("Multiple entries match '{token}':\n  {}\n\nPlease be more specific or use a row number.", candidates.join("\n  "))]
    AmbiguousMatch {
        token: String,
        candidates: Vec<String>,
    },

    /// A project configuration problem.
    ///
    /// Includes an optional hint about how to fix it.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    Config {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An external command-line tool was missing or exited non-zero.
    #[error("{tool} failed{}: {message}", status.map(|s| format!(" (exit status {})", s)).unwrap_or_default())]
    ExternalTool {
        tool: String,
        status: Option<i32>,
        message: String,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A semantic versioning parsing error, wrapped from `semver::Error`.
    #[error("Semver parsing error: {0}")]
    Semver(#[from] semver::Error),
}

/// The broad class an [`Error`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or ambiguous input. Retrying with corrected input succeeds.
    UserInput,
    /// On-disk state is inconsistent. Never repaired automatically.
    DataIntegrity,
    /// An external tool is absent or failed.
    ExternalTool,
    /// The filesystem or a serializer failed.
    Io,
}

impl Error {
    /// Returns the category this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidKind { .. }
            | Error::AmbiguousProject { .. }
            | Error::UnknownProject { .. }
            | Error::InvalidComponent { .. }
            | Error::DuplicateEntryId { .. }
            | Error::EmptySlug { .. }
            | Error::InvalidVersion { .. }
            | Error::Usage { .. }
            | Error::NoUnusedEntries { .. }
            | Error::VersionConflict { .. }
            | Error::MissingBaseline { .. }
            | Error::EmptyIdentifier
            | Error::RowOutOfRange { .. }
            | Error::UnknownRelease { .. }
            | Error::NoMatch { .. }
            | Error::AmbiguousMatch { .. }
            | Error::Config { .. }
            | Error::Glob(_)
            | Error::Semver(_) => ErrorCategory::UserInput,
            Error::EntryParse { .. }
            | Error::ManifestParse { .. }
            | Error::CorruptManifest { .. }
            | Error::RelocationFailed { .. } => ErrorCategory::DataIntegrity,
            Error::ExternalTool { .. } => ErrorCategory::ExternalTool,
            Error::Io(_) | Error::Yaml(_) => ErrorCategory::Io,
        }
    }

    /// Returns the process exit code for this error.
    ///
    /// External tool failures pass the tool's own status through; everything
    /// else exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ExternalTool {
                status: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
