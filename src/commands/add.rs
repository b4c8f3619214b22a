//! # Add Command Implementation
//!
//! This module implements the `add` subcommand, which writes a new entry
//! into the pending pool (`unreleased/`).
//!
//! ## Functionality
//!
//! - **Title to id**: The title is slugified into the entry id; an id that is
//!   already pending or released is rejected.
//! - **Validation**: Type, project, and components are checked against the
//!   project configuration before anything is written.
//! - **Interactive title**: Without a title argument on a terminal, the title
//!   is prompted for.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Input};

use shiplog::entry::EntryDraft;
use shiplog::output::{emoji, OutputSink};
use shiplog::suggestions;

use super::{ensure_valid, open_project};

/// Create a new pending changelog entry
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Entry title. Prompted for when omitted on a terminal.
    #[arg(value_name = "TITLE")]
    pub title: Option<String>,

    /// Entry type (breaking, feature, bugfix, change)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "change")]
    pub kind: String,

    /// Project the entry belongs to
    #[arg(long, value_name = "ID")]
    pub project: Option<String>,

    /// Component label (repeatable)
    #[arg(short, long = "component", value_name = "NAME")]
    pub components: Vec<String>,

    /// Author handle or name (repeatable)
    #[arg(short, long = "author", value_name = "NAME")]
    pub authors: Vec<String>,

    /// Pull request number, with or without a leading '#' (repeatable)
    #[arg(long = "pr", value_name = "NUMBER", value_parser = parse_pr)]
    pub prs: Vec<u64>,

    /// Entry body text
    #[arg(short, long, value_name = "TEXT", conflicts_with = "body_file")]
    pub description: Option<String>,

    /// Read the entry body from a file
    #[arg(long, value_name = "FILE")]
    pub body_file: Option<PathBuf>,
}

fn parse_pr(value: &str) -> std::result::Result<u64, String> {
    value
        .trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| format!("'{value}' is not a pull request number"))
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    ensure_valid(&project, "add an entry", sink)?;

    let title = match args.title {
        Some(title) => title,
        None if console::Term::stderr().is_term() => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Entry title")
            .interact_text()?,
        None => anyhow::bail!("An entry title is required\n\nhint: shiplog add \"Fix crash on startup\""),
    };

    let body = match &args.body_file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read body from {}", path.display()))?,
        None => args.description.unwrap_or_default(),
    };

    let draft = EntryDraft {
        title,
        kind: args.kind,
        projects: args.project.into_iter().collect(),
        components: args.components,
        authors: args.authors,
        prs: args.prs,
        created: None,
        body,
    };

    let entry = project.create_entry(draft).map_err(suggestions::explain)?;
    sink.success(&format!(
        "{} Created entry {} at {}",
        emoji(sink.config(), "📝", "[NEW]"),
        entry.id,
        entry.path.display()
    ));
    Ok(())
}
