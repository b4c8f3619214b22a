//! # Stats Command Implementation
//!
//! Shows release and entry statistics for the project and, when modules are
//! configured, for every module. A single project is shown as a card; with
//! modules, or with `--table`, one row per project is printed instead.

use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::Args;
use serde::Serialize;

use shiplog::entry::EntryKind;
use shiplog::notes::{kind_emoji, SECTION_ORDER};
use shiplog::output::OutputSink;
use shiplog::stats::{self, format_age, ProjectStats};

use super::open_project;

/// Show release and entry statistics
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Emit JSON instead of text
    #[arg(long, conflicts_with = "table")]
    pub json: bool,

    /// Show one row per project even without modules
    #[arg(long)]
    pub table: bool,
}

#[derive(Serialize)]
struct StatsJson {
    project_root: String,
    parent: ProjectStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    modules: Option<Vec<ProjectStats>>,
}

/// Execute the `stats` command.
pub fn execute(args: StatsArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    let today = Utc::now().date_naive();

    let parent = stats::collect(&project, ".", today)?;
    let modules = if project.config().modules.is_some() {
        let mut rows = Vec::new();
        for module in project.modules()? {
            rows.push(stats::collect(&module.project(), &module.relative_path, today)?);
        }
        Some(rows)
    } else {
        None
    };
    let project_root = root
        .canonicalize()
        .unwrap_or_else(|_| root.to_path_buf())
        .display()
        .to_string();

    if args.json {
        let document = StatsJson {
            project_root,
            parent,
            modules,
        };
        sink.emit(&serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    sink.info(&format!("Project root: {project_root}"));
    match modules {
        None if !args.table => {
            for line in card(&parent) {
                sink.emit(&line);
            }
        }
        modules => {
            let rows: Vec<&ProjectStats> = std::iter::once(&parent)
                .chain(modules.iter().flatten())
                .collect();
            for line in table(&rows) {
                sink.emit(&line);
            }
        }
    }
    Ok(())
}

fn kind_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Breaking => "Breaking",
        EntryKind::Feature => "Feature",
        EntryKind::Change => "Change",
        EntryKind::Bugfix => "Bugfix",
    }
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

/// Vertical layout for a single project.
fn card(stats: &ProjectStats) -> Vec<String> {
    let releases = &stats.releases;
    let entries = &stats.entries;
    let row = |label: &str, value: &str, extra: &str| {
        format!("{label:<14} {value:>10}  {extra}").trim_end().to_string()
    };

    let mut lines = vec!["Project".to_string()];
    lines.push(row("Name", &stats.id, &stats.name));
    lines.push(row(
        "Version",
        releases.latest.as_deref().unwrap_or("unreleased"),
        &releases
            .latest_entries
            .filter(|n| *n > 0)
            .map(|n| format!("{n} entries"))
            .unwrap_or_default(),
    ));
    lines.push(row(
        "Age",
        &or_dash(releases.age_days.map(format_age)),
        &releases.last.map(|d| d.to_string()).unwrap_or_default(),
    ));

    lines.push(String::new());
    lines.push("Releases".to_string());
    lines.push(row(
        "Count",
        &releases.count.to_string(),
        &releases
            .span_days()
            .map(|days| format!("over {}", format_age(days)))
            .unwrap_or_default(),
    ));
    if let Some(per_month) = releases.cadence {
        lines.push(row(
            "Cadence",
            &format!("{per_month}/mo"),
            &format!("{}/yr", per_month * 12),
        ));
    }

    lines.push(String::new());
    lines.push("Entry Types".to_string());
    for kind in SECTION_ORDER {
        let count = entries.count(kind);
        if count == 0 {
            lines.push(row(kind_label(kind), "-", ""));
        } else {
            lines.push(row(
                kind_label(kind),
                &count.to_string(),
                &format!("{}%", entries.percent(count)),
            ));
        }
    }

    lines.push(String::new());
    lines.push("Entry Status".to_string());
    lines.push(row("Total", &entries.total.to_string(), "100%"));
    lines.push(row(
        "Shipped",
        &entries.shipped.to_string(),
        &format!("{}%", entries.percent(entries.shipped)),
    ));
    lines.push(row(
        "Unreleased",
        &entries.unreleased.to_string(),
        &format!("{}%", entries.percent(entries.unreleased)),
    ));
    lines
}

/// One row per project, columns padded to the widest cell.
fn table(rows: &[&ProjectStats]) -> Vec<String> {
    let mut header: Vec<String> = ["ID", "PATH", "VERSION", "AGE", "RELEASES", "CADENCE"]
        .into_iter()
        .map(str::to_string)
        .collect();
    header.extend(SECTION_ORDER.iter().map(|k| kind_emoji(*k).to_string()));
    header.extend(["TOTAL", "SHIPPED", "UNRELEASED"].map(str::to_string));

    let mut cells: Vec<Vec<String>> = vec![header];
    for stats in rows {
        let releases = &stats.releases;
        let entries = &stats.entries;
        let mut line = vec![
            stats.id.clone(),
            stats.path.clone(),
            or_dash(releases.latest.clone()),
            or_dash(releases.age_days.map(format_age)),
            releases.count.to_string(),
            or_dash(releases.cadence.map(|n| format!("{n}/mo"))),
        ];
        line.extend(SECTION_ORDER.iter().map(|kind| match entries.count(*kind) {
            0 => "-".to_string(),
            n => n.to_string(),
        }));
        line.extend([
            entries.total.to_string(),
            entries.shipped.to_string(),
            entries.unreleased.to_string(),
        ]);
        cells.push(line);
    }

    let columns = cells[0].len();
    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            cells
                .iter()
                .map(|row| console::measure_text_width(&row[i]))
                .max()
                .unwrap_or(0)
        })
        .collect();
    cells
        .iter()
        .map(|row| {
            row.iter()
                .zip(&widths)
                .map(|(cell, width)| console::pad_str(cell, *width, console::Alignment::Left, None))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiplog::output::MemorySink;
    use std::fs;
    use tempfile::TempDir;

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("config.yaml"), "id: core\nname: Core\n").unwrap();
        fs::create_dir_all(temp_dir.path().join("unreleased")).unwrap();
        fs::write(
            temp_dir.path().join("unreleased/fix-a.md"),
            "---\ntitle: Fix A\ntype: bugfix\n---\n",
        )
        .unwrap();
        temp_dir
    }

    #[test]
    fn test_card_for_single_project() {
        let temp_dir = setup();
        let sink = MemorySink::new();
        execute(
            StatsArgs {
                json: false,
                table: false,
            },
            temp_dir.path(),
            &sink,
        )
        .unwrap();
        let text = sink.emitted();
        assert!(text.contains("Version"));
        assert!(text.contains("unreleased"));
        assert!(text.lines().any(|l| l.starts_with("Bugfix") && l.ends_with("100%")));
        assert!(text.lines().any(|l| l.starts_with("Unreleased") && l.contains(" 1 ")));
    }

    #[test]
    fn test_table_lists_modules() {
        let temp_dir = setup();
        let root = temp_dir.path();
        fs::write(root.join("config.yaml"), "id: core\nmodules: plugins/*\n").unwrap();
        fs::create_dir_all(root.join("plugins/s3")).unwrap();
        fs::write(root.join("plugins/s3/config.yaml"), "id: s3\n").unwrap();

        let sink = MemorySink::new();
        execute(
            StatsArgs {
                json: false,
                table: false,
            },
            root,
            &sink,
        )
        .unwrap();
        let lines = sink.channel(shiplog::output::Channel::Emit);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("ID"));
        assert!(lines[1].starts_with("core"));
        assert!(lines[2].starts_with("s3  "));
        assert!(lines[2].contains("plugins/s3"));
    }

    #[test]
    fn test_json_shape() {
        let temp_dir = setup();
        let sink = MemorySink::new();
        execute(
            StatsArgs {
                json: true,
                table: false,
            },
            temp_dir.path(),
            &sink,
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&sink.emitted()).unwrap();
        assert_eq!(value["parent"]["id"], "core");
        assert_eq!(value["parent"]["path"], ".");
        assert_eq!(value["parent"]["releases"]["count"], 0);
        assert!(value["parent"]["releases"]["latest"].is_null());
        assert_eq!(value["parent"]["entries"]["unreleased"], 1);
        assert_eq!(value["parent"]["entries"]["bugfix"], 1);
        assert!(value.get("modules").is_none());
    }
}
