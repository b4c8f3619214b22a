//! # Show Command Implementation
//!
//! This module implements the `show` subcommand.
//!
//! - Without identifiers it prints a table of every entry, newest first,
//!   with row numbers that the other identifier forms accept.
//! - With identifiers each token is resolved on its own (row number,
//!   release version, or id fragment) and printed as an entry card or a
//!   release card.
//! - `--json` emits the same data as a JSON document.
//!
//! Module entries are included when the project configures modules.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use console::{measure_text_width, pad_str, style, Alignment};
use serde::Serialize;

use shiplog::entry::{Entry, EntryKind};
use shiplog::output::OutputSink;
use shiplog::release::ReleaseManifest;
use shiplog::resolve::{Resolution, ResolutionKind};
use shiplog::snapshot::Snapshot;
use shiplog::suggestions;

use super::open_project;

/// List entries or show entries and releases by identifier
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Row numbers, release versions (v1.2.0), or entry id fragments
    #[arg(value_name = "IDENTIFIER")]
    pub identifiers: Vec<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct EntryJson<'a> {
    id: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    kind: EntryKind,
    project: &'a str,
    components: &'a [String],
    authors: &'a [String],
    prs: &'a [u64],
    created: Option<String>,
    body: &'a str,
    versions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<&'a str>,
}

#[derive(Serialize)]
struct ReleaseJson<'a> {
    version: &'a str,
    title: &'a str,
    created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    intro: Option<&'a str>,
    entries: &'a [String],
}

#[derive(Serialize)]
struct ShowJson<'a> {
    entries: Vec<EntryJson<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    releases: Vec<ReleaseJson<'a>>,
}

fn entry_json<'a>(entry: &'a Entry, snapshot: &'a Snapshot) -> EntryJson<'a> {
    EntryJson {
        id: &entry.id,
        title: entry.title(),
        kind: entry.kind(),
        project: snapshot.project_of(entry),
        components: &entry.header.components,
        authors: &entry.header.authors,
        prs: &entry.header.prs,
        created: entry.header.created.map(|c| c.to_rfc3339()),
        body: &entry.body,
        versions: snapshot.index.versions(&entry.id),
        module: snapshot.owners.get(&entry.id).map(String::as_str),
    }
}

fn release_json(manifest: &ReleaseManifest) -> ReleaseJson<'_> {
    ReleaseJson {
        version: &manifest.version,
        title: &manifest.title,
        created: manifest.created.to_string(),
        intro: manifest.intro.as_deref(),
        entries: &manifest.entries,
    }
}

/// Execute the `show` command.
pub fn execute(args: ShowArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    let include_modules = project.config().modules.is_some();
    let snapshot = Snapshot::gather(&project, include_modules)?;

    if args.identifiers.is_empty() {
        let entries: Vec<&Entry> = snapshot.rows().map(|(_, entry)| entry).collect();
        if args.json {
            let document = ShowJson {
                entries: entries.iter().map(|e| entry_json(e, &snapshot)).collect(),
                releases: Vec::new(),
            };
            sink.emit(&serde_json::to_string_pretty(&document)?);
        } else if entries.is_empty() {
            sink.info("No entries yet. Create one with 'shiplog add'.");
        } else {
            sink.emit(&render_table(&snapshot, sink.config().use_color));
        }
        return Ok(());
    }

    let resolutions = snapshot
        .resolve_all(&args.identifiers)
        .map_err(suggestions::explain)?;

    if args.json {
        let mut document = ShowJson {
            entries: Vec::new(),
            releases: Vec::new(),
        };
        for resolution in &resolutions {
            if let Some(manifest) = &resolution.manifest {
                document.releases.push(release_json(manifest));
            }
            document
                .entries
                .extend(resolution.entries.iter().map(|e| entry_json(e, &snapshot)));
        }
        sink.emit(&serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    let rows: BTreeMap<&str, usize> = snapshot
        .rows()
        .map(|(row, entry)| (entry.id.as_str(), row))
        .collect();
    let cards: Vec<String> = resolutions
        .iter()
        .map(|resolution| render_resolution(resolution, &snapshot, &rows))
        .collect();
    sink.emit(&cards.join("\n\n"));
    Ok(())
}

fn released_in(snapshot: &Snapshot, id: &str) -> String {
    let versions = snapshot.index.versions(id);
    if versions.is_empty() {
        "unreleased".to_string()
    } else {
        versions.join(", ")
    }
}

fn render_table(snapshot: &Snapshot, color: bool) -> String {
    let header = ["#", "Release", "Type", "Title", "ID"];
    let rows: Vec<[String; 5]> = snapshot
        .rows()
        .map(|(row, entry)| {
            [
                row.to_string(),
                released_in(snapshot, &entry.id),
                entry.kind().as_str().to_string(),
                entry.title().to_string(),
                entry.id.clone(),
            ]
        })
        .collect();

    let mut widths = header.map(measure_text_width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let format_row = |cells: [&str; 5]| -> String {
        cells
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                let align = if i == 0 { Alignment::Right } else { Alignment::Left };
                pad_str(cell, width, align, None).into_owned()
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 1);
    let header_line = format_row(header);
    lines.push(if color {
        style(header_line).bold().to_string()
    } else {
        header_line
    });
    for row in &rows {
        lines.push(format_row([&row[0], &row[1], &row[2], &row[3], &row[4]]));
    }
    lines.join("\n")
}

fn render_resolution(
    resolution: &Resolution,
    snapshot: &Snapshot,
    rows: &BTreeMap<&str, usize>,
) -> String {
    match (&resolution.kind, &resolution.manifest) {
        (ResolutionKind::Release, Some(manifest)) => render_release_card(manifest, &resolution.entries),
        _ => resolution
            .entries
            .iter()
            .map(|entry| render_entry_card(entry, snapshot, rows.get(entry.id.as_str()).copied()))
            .collect::<Vec<_>>()
            .join("\n\n"),
    }
}

fn render_entry_card(entry: &Entry, snapshot: &Snapshot, row: Option<usize>) -> String {
    let mut lines = vec![match row {
        Some(row) => format!("{} (row {})", entry.id, row),
        None => entry.id.clone(),
    }];
    let mut field = |name: &str, value: String| {
        if !value.is_empty() {
            lines.push(format!("  {:<12}{}", format!("{name}:"), value));
        }
    };
    field("Title", entry.title().to_string());
    field("Type", entry.kind().as_str().to_string());
    field("Release", released_in(snapshot, &entry.id));
    field(
        "Module",
        snapshot.owners.get(&entry.id).cloned().unwrap_or_default(),
    );
    field("Project", snapshot.project_of(entry).to_string());
    field("Components", entry.header.components.join(", "));
    field("Authors", entry.header.authors.join(", "));
    field(
        "PRs",
        entry
            .header
            .prs
            .iter()
            .map(|pr| format!("#{pr}"))
            .collect::<Vec<_>>()
            .join(", "),
    );
    field(
        "Created",
        entry
            .header
            .created
            .map(|c| c.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_default(),
    );
    if !entry.body.is_empty() {
        lines.push(String::new());
        lines.extend(entry.body.lines().map(|line| format!("  {line}")));
    }
    lines.join("\n")
}

fn render_release_card(manifest: &ReleaseManifest, entries: &[Entry]) -> String {
    let mut lines = vec![format!("Release {}", manifest.version)];
    lines.push(format!("  {:<12}{}", "Title:", manifest.title));
    lines.push(format!("  {:<12}{}", "Date:", manifest.created));
    if let Some(intro) = manifest.intro.as_deref().filter(|i| !i.is_empty()) {
        lines.push(String::new());
        lines.extend(intro.lines().map(|line| format!("  {line}")));
    }
    lines.push(String::new());
    lines.push(format!("  Entries ({}):", entries.len()));
    for entry in entries {
        lines.push(format!(
            "    - {} [{}] {}",
            entry.id,
            entry.kind().as_str(),
            entry.title()
        ));
    }
    lines.join("\n")
}
