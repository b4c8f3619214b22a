//! # Modules Command Implementation
//!
//! Lists the modules discovered through the project's `modules` pattern,
//! with each module's latest release and number of pending entries.

use std::path::Path;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use shiplog::output::OutputSink;

use super::open_project;

/// List the modules configured for this project
#[derive(Args, Debug)]
pub struct ModulesArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ModuleRow {
    id: String,
    name: String,
    path: String,
    latest: Option<String>,
    pending: usize,
}

/// Execute the `modules` command.
pub fn execute(args: ModulesArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    if project.config().modules.is_none() {
        sink.info("No modules configured. Set 'modules: <glob>' in config.yaml.");
        return Ok(());
    }

    let mut rows = Vec::new();
    for module in project.modules()? {
        let module_project = module.project();
        rows.push(ModuleRow {
            id: module.config.id.clone(),
            name: module.config.name.clone(),
            path: module.relative_path.clone(),
            latest: module_project
                .latest_version()?
                .map(|v| v.as_str().to_string()),
            pending: module_project.unused_entries()?.len(),
        });
    }

    if args.json {
        sink.emit(&serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        sink.info("No modules matched the configured pattern.");
        return Ok(());
    }
    for row in &rows {
        sink.emit(&format!(
            "{}  {}  {}  {}  {} pending",
            row.id,
            row.name,
            row.path,
            row.latest.as_deref().unwrap_or("unreleased"),
            row.pending
        ));
    }
    Ok(())
}
