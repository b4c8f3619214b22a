//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::MINIMAL);
//!     fixture.command().arg("show").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::Path;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::entry_file;
    #[allow(unused_imports)]
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// Minimal valid project configuration.
    pub const MINIMAL: &str = "id: core\nname: Core\n";

    /// Configuration with a restricted component list.
    pub const WITH_COMPONENTS: &str = "id: core\nname: Core\ncomponents: [cli, server]\n";

    /// Configuration with a forge repository.
    pub const WITH_REPOSITORY: &str = "id: core\nname: Core\nrepository: acme/core\n";

    /// Configuration that aggregates modules under `plugins/`.
    pub const WITH_MODULES: &str = "id: core\nname: Core\nmodules: plugins/*\n";
}

/// Render an entry file with the given header fields and body.
#[allow(dead_code)]
pub fn entry_file(title: &str, kind: &str, created: &str, body: &str) -> String {
    format!("---\ntitle: {title}\ntype: {kind}\ncreated: {created}\n---\n\n{body}\n")
}

/// A temporary changelog project.
#[allow(dead_code)]
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `config.yaml` with the given content.
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("config.yaml", content)
    }

    /// Add a pending entry file `unreleased/<id>.md`.
    pub fn with_entry(self, id: &str, content: &str) -> Self {
        self.with_file(&format!("unreleased/{id}.md"), content)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Read a file below the fixture root.
    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Create a command that targets this fixture via `--root`, with colors
    /// disabled.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("shiplog");
        cmd.arg("--root")
            .arg(self.path())
            .env("NO_COLOR", "1")
            .env_remove("SHIPLOG_ROOT")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
