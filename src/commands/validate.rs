//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which runs the
//! structural checks over the project and its modules and reports every
//! issue found.
//!
//! This command is a safe, read-only operation that does not modify any
//! files. It exits non-zero when any error is reported (or any warning with
//! `--strict`).

use std::path::Path;

use anyhow::Result;
use clap::Args;

use shiplog::output::{emoji, OutputSink};
use shiplog::validate::{validate_project, validate_with_modules, Severity};

use super::open_project;

/// Check entries, manifests, and modules for structural problems
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Skip the configured modules
    #[arg(long)]
    pub no_modules: bool,

    /// Use strict validation (fail on warnings).
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    let out = sink.config();
    sink.info(&format!(
        "{} Validating changelog project {}",
        emoji(out, "🔍", "[SCAN]"),
        project.config().id
    ));

    let issues = if args.no_modules {
        validate_project(&project)?
    } else {
        validate_with_modules(&project)?
    };

    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    let warnings = issues.len() - errors;
    for issue in &issues {
        match issue.severity {
            Severity::Error => sink.warn(&format!("{} {}", emoji(out, "❌", "[ERR]"), issue)),
            Severity::Warning => sink.warn(&issue.to_string()),
        }
    }

    if errors > 0 || (args.strict && warnings > 0) {
        anyhow::bail!(
            "Validation failed with {} error(s) and {} warning(s)",
            errors,
            warnings
        );
    }

    if warnings > 0 {
        sink.success(&format!("Validation passed with {warnings} warning(s)"));
    } else {
        sink.success("Validation passed");
    }
    Ok(())
}
