//! # Module Discovery
//!
//! A project may aggregate sibling changelog projects, called modules. The
//! `modules` setting in the parent's configuration is a glob pattern such as
//! `../packages/*/changelog` or `plugins/*`.
//!
//! Discovery runs in two phases:
//!
//! 1. Leading `..` components of the pattern are consumed, each one moving
//!    the search root to its parent directory.
//! 2. The remaining pattern is matched from that root with the `glob` crate.
//!
//! Matches that are not directories, that resolve to the parent itself, or
//! whose configuration fails to load are skipped. A failed load is logged as
//! a warning and never aborts discovery.
//!
//! Modules are never persisted; every query rediscovers them.

use std::path::{Component, Path, PathBuf};

use log::{debug, warn};

use crate::config::{self, Config};
use crate::error::Result;
use crate::project::Project;

/// A discovered sibling changelog project.
#[derive(Debug, Clone)]
pub struct Module {
    /// Canonical path of the module's changelog root.
    pub root: PathBuf,
    pub config: Config,
    /// Path relative to the parent root, for display.
    pub relative_path: String,
}

impl Module {
    /// The module as a project of its own.
    pub fn project(&self) -> Project {
        Project::from_parts(self.root.clone(), self.config.clone())
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }
}

/// Split a pattern into the number of leading walk-up segments and the
/// remaining pattern. An empty remainder becomes `*`.
fn split_walk_up(pattern: &str) -> (usize, String) {
    let mut walk_up = 0;
    let mut rest: Vec<String> = Vec::new();
    for component in Path::new(pattern).components() {
        match component {
            Component::ParentDir if rest.is_empty() => walk_up += 1,
            Component::CurDir if rest.is_empty() => {}
            other => rest.push(other.as_os_str().to_string_lossy().into_owned()),
        }
    }
    let remaining = if rest.is_empty() {
        "*".to_string()
    } else {
        rest.join("/")
    };
    (walk_up, remaining)
}

/// Discover modules matching `pattern` relative to `parent_root`.
///
/// Results are ordered by matched path.
pub fn discover(parent_root: &Path, pattern: &str) -> Result<Vec<Module>> {
    let parent = parent_root.canonicalize()?;
    let (walk_up, remaining) = split_walk_up(pattern);

    let mut base = parent.clone();
    for _ in 0..walk_up {
        if let Some(up) = base.parent() {
            base = up.to_path_buf();
        }
    }

    let full_pattern = format!(
        "{}/{}",
        glob::Pattern::escape(&base.to_string_lossy()),
        remaining
    );
    debug!("discovering modules with pattern {}", full_pattern);

    let mut matches: Vec<PathBuf> = glob::glob(&full_pattern)?
        .filter_map(|m| m.ok())
        .collect();
    matches.sort();

    let mut modules = Vec::new();
    for candidate in matches {
        if !candidate.is_dir() {
            continue;
        }
        let Ok(resolved) = candidate.canonicalize() else {
            continue;
        };
        if resolved == parent {
            continue;
        }
        let config = match config::load_project_config(&resolved) {
            Ok(config) => config,
            Err(e) => {
                warn!("Skipping module candidate {}: {}", candidate.display(), e);
                continue;
            }
        };
        let relative_path = display_path(&candidate, &parent, &base, walk_up);
        modules.push(Module {
            root: resolved,
            config,
            relative_path,
        });
    }
    Ok(modules)
}

fn display_path(candidate: &Path, parent: &Path, base: &Path, walk_up: usize) -> String {
    if let Ok(inside) = candidate.strip_prefix(parent) {
        return inside.to_string_lossy().into_owned();
    }
    let below_base = candidate
        .strip_prefix(base)
        .unwrap_or(candidate)
        .to_string_lossy()
        .into_owned();
    format!("{}{}", "../".repeat(walk_up), below_base)
}

/// Discover the modules a configuration asks for, ordered by module id.
///
/// Returns an empty list without touching the filesystem when no pattern is
/// configured.
pub fn discover_from_config(parent_root: &Path, config: &Config) -> Result<Vec<Module>> {
    let Some(pattern) = config.modules.as_deref().filter(|p| !p.trim().is_empty()) else {
        return Ok(Vec::new());
    };
    let mut modules = discover(parent_root, pattern.trim())?;
    modules.sort_by(|a, b| a.config.id.cmp(&b.config.id));
    Ok(modules)
}
