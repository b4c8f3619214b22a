//! # Release Command Implementation
//!
//! This module implements the `release` subcommand group:
//!
//! - **`release create`**: Promotes unused entries into a release. Without
//!   `--yes` the planned changes are shown and nothing is written. Running
//!   it again for the same release reports "up to date" and touches no file.
//! - **`release publish`**: Publishes an existing release with `gh`,
//!   optionally committing and tagging first.
//! - **`release version`**: Prints the latest release version.
//! - **`release notes`**: Re-renders a release, or the unreleased entries,
//!   as Markdown or JSON on stdout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

use shiplog::error::Error;
use shiplog::export::{ExportFormat, ReleaseExport};
use shiplog::git::SystemRunner;
use shiplog::notes::NotesStyle;
use shiplog::output::{emoji, OutputSink};
use shiplog::project::Project;
use shiplog::promote::{promote, PromoteOptions, PromoteOutcome, ReleasePlan};
use shiplog::publish::{execute_publish, plan_publish, PublishOptions};
use shiplog::suggestions;
use shiplog::version::Bump;

use super::{ensure_valid, open_project};

/// Create, publish, or inspect releases
#[derive(Args, Debug)]
pub struct ReleaseArgs {
    #[command(subcommand)]
    pub command: ReleaseCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReleaseCommand {
    /// Promote unused entries into a release
    Create(CreateArgs),
    /// Publish a release to GitHub
    Publish(PublishArgs),
    /// Print the latest release version
    Version(VersionArgs),
    /// Render the notes of a release to stdout
    Notes(NotesArgs),
}

/// Arguments for `release create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Version label, e.g. v1.2.0
    #[arg(value_name = "VERSION")]
    pub version: Option<String>,

    /// Bump the patch component of the latest release
    #[arg(long, group = "bump", conflicts_with = "version")]
    pub patch: bool,

    /// Bump the minor component of the latest release
    #[arg(long, group = "bump", conflicts_with = "version")]
    pub minor: bool,

    /// Bump the major component of the latest release
    #[arg(long, group = "bump", conflicts_with = "version")]
    pub major: bool,

    /// Release title (defaults to "<project name> <version>")
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Intro text placed above the release notes
    #[arg(long, value_name = "TEXT", conflicts_with = "intro_file")]
    pub intro: Option<String>,

    /// Read the intro text from a file
    #[arg(long, value_name = "FILE")]
    pub intro_file: Option<PathBuf>,

    /// Release date (YYYY-MM-DD, defaults to today)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub date: Option<NaiveDate>,

    /// Notes style (keeps the existing style when omitted)
    #[arg(long, value_enum)]
    pub style: Option<NotesStyle>,

    /// Render pull request references as full links
    #[arg(long)]
    pub explicit_links: bool,

    /// Apply the changes instead of only showing them
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `release publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Version label of an existing release
    #[arg(value_name = "VERSION")]
    pub version: String,

    /// Create the GitHub release as a draft
    #[arg(long)]
    pub draft: bool,

    /// Mark the GitHub release as a prerelease
    #[arg(long)]
    pub prerelease: bool,

    /// Do not mark the GitHub release as latest
    #[arg(long)]
    pub no_latest: bool,

    /// Create and push an annotated git tag before publishing
    #[arg(long)]
    pub tag: bool,

    /// Commit staged changes before tagging (requires --tag)
    #[arg(long, requires = "tag")]
    pub commit: bool,

    /// Commit message (defaults to "Release <version>")
    #[arg(long, value_name = "TEXT", requires = "commit")]
    pub commit_message: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `release version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Strip a leading 'v' or 'V'
    #[arg(long)]
    pub bare: bool,
}

/// Arguments for `release notes`.
#[derive(Args, Debug)]
pub struct NotesArgs {
    /// Version label (defaults to the latest release)
    #[arg(value_name = "VERSION", conflicts_with = "unreleased")]
    pub version: Option<String>,

    /// Render the entries no release contains yet
    #[arg(long)]
    pub unreleased: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
    pub format: ExportFormat,

    /// Notes style (defaults to the configured export style)
    #[arg(long, value_enum)]
    pub style: Option<NotesStyle>,

    /// Render pull request references as full links
    #[arg(long)]
    pub explicit_links: bool,
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("'{value}' is not a YYYY-MM-DD date: {e}"))
}

impl CreateArgs {
    fn bump(&self) -> Option<Bump> {
        if self.patch {
            Some(Bump::Patch)
        } else if self.minor {
            Some(Bump::Minor)
        } else if self.major {
            Some(Bump::Major)
        } else {
            None
        }
    }

    fn into_options(self) -> Result<PromoteOptions> {
        let bump = self.bump();
        let intro = match &self.intro_file {
            Some(path) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("Failed to read intro from {}", path.display()))?,
            ),
            None => self.intro,
        };
        Ok(PromoteOptions {
            version: self.version,
            bump,
            title: self.title,
            intro,
            date: self.date,
            style: self.style,
            explicit_links: self.explicit_links,
            confirm: self.yes,
        })
    }
}

/// Execute the `release` command group.
pub fn execute(args: ReleaseArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    match args.command {
        ReleaseCommand::Create(args) => create(args, root, sink),
        ReleaseCommand::Publish(args) => publish(args, root, sink),
        ReleaseCommand::Version(args) => version(args, root, sink),
        ReleaseCommand::Notes(args) => notes(args, root, sink),
    }
}

fn describe_plan(plan: &ReleasePlan, sink: &dyn OutputSink) {
    sink.info(&format!("Release {}:", plan.version()));
    for change in &plan.changes {
        sink.info(&format!("  - {change}"));
    }
    for entry in &plan.new_entries {
        sink.info(&format!("    + {} ({})", entry.id, entry.kind().as_str()));
    }
}

fn create(args: CreateArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    ensure_valid(&project, "create a release", sink)?;
    let options = args.into_options()?;

    match promote(&project, &options).map_err(suggestions::explain)? {
        PromoteOutcome::UpToDate { version } => {
            sink.success(&format!("Release {version} is up to date"));
            Ok(())
        }
        PromoteOutcome::Pending { plan } => {
            describe_plan(&plan, sink);
            sink.info("Re-run with --yes to apply these changes.");
            anyhow::bail!("Release {} has unapplied changes", plan.version())
        }
        PromoteOutcome::Applied { plan } => {
            describe_plan(&plan, sink);
            sink.success(&format!(
                "{} Release {} written with {} entries",
                emoji(sink.config(), "🚢", "[OK]"),
                plan.version(),
                plan.manifest.entries.len()
            ));
            Ok(())
        }
    }
}

fn publish(args: PublishArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    ensure_valid(&project, "publish a release", sink)?;

    let options = PublishOptions {
        version: args.version,
        draft: args.draft,
        prerelease: args.prerelease,
        no_latest: args.no_latest,
        create_tag: args.tag,
        create_commit: args.commit,
        commit_message: args.commit_message,
    };

    let runner = SystemRunner;
    let plan = match plan_publish(&project, &options, &runner) {
        Ok(plan) => plan,
        Err(Error::UnknownRelease { version }) => {
            let known: Vec<String> = project
                .releases()
                .list()?
                .into_iter()
                .map(|m| m.version)
                .collect();
            return Err(suggestions::release_not_found(&version, &known));
        }
        Err(e) => return Err(suggestions::explain(e)),
    };

    sink.info(&format!(
        "Publishing {} to GitHub repository {}:",
        plan.version, plan.repository
    ));
    for step in &plan.steps {
        sink.info(&format!("  $ {step}"));
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Publish {}?", plan.version))
            .default(true)
            .interact()?;
        if !confirmed {
            sink.info("Aborted release publish.");
            return Ok(());
        }
    }

    let report = execute_publish(&project, &plan, &runner)?;
    if report.tag_created == Some(false) {
        sink.warn(&format!(
            "git tag {} already exists; skipped creation",
            plan.version
        ));
    }
    sink.success(&format!(
        "{} Published {} to GitHub repository {}",
        emoji(sink.config(), "🚀", "[OK]"),
        plan.version,
        plan.repository
    ));
    Ok(())
}

fn latest_release(project: &Project) -> Result<String> {
    match project.latest_version()? {
        Some(label) => Ok(label.as_str().to_string()),
        None => Err(suggestions::no_releases()),
    }
}

fn version(args: VersionArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    let latest = latest_release(&project)?;
    let shown = if args.bare {
        latest.trim_start_matches(['v', 'V'])
    } else {
        latest.as_str()
    };
    sink.emit(shown);
    Ok(())
}

fn notes(args: NotesArgs, root: &Path, sink: &dyn OutputSink) -> Result<()> {
    let project = open_project(root)?;
    let config = project.config();
    let style = args.style.unwrap_or(config.export_style);

    let export = if args.unreleased {
        ReleaseExport::unreleased(&project)?
    } else {
        let version = match args.version {
            Some(version) => version,
            None => latest_release(&project)?,
        };
        match ReleaseExport::release(&project, &version) {
            Ok(export) => export,
            Err(Error::UnknownRelease { version }) => {
                let known: Vec<String> = project
                    .releases()
                    .list()?
                    .into_iter()
                    .map(|m| m.version)
                    .collect();
                return Err(suggestions::release_not_found(&version, &known));
            }
            Err(e) => return Err(suggestions::explain(e)),
        }
    };

    match args.format {
        ExportFormat::Markdown => {
            let markdown = export.to_markdown(config, style, args.explicit_links);
            sink.emit(markdown.trim_end_matches('\n'));
        }
        ExportFormat::Json => {
            let document =
                export.to_json(config, style == NotesStyle::Compact, Utc::now().date_naive());
            sink.emit(&serde_json::to_string_pretty(&document)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiplog::output::{Channel, MemorySink};
    use tempfile::TempDir;

    fn create_args(version: &str, yes: bool) -> CreateArgs {
        CreateArgs {
            version: Some(version.to_string()),
            patch: false,
            minor: false,
            major: false,
            title: None,
            intro: None,
            intro_file: None,
            date: NaiveDate::from_ymd_opt(2025, 3, 1),
            style: None,
            explicit_links: false,
            yes,
        }
    }

    fn setup() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("config.yaml"), "id: core\nname: Core\n").unwrap();
        fs::create_dir_all(temp_dir.path().join("unreleased")).unwrap();
        fs::write(
            temp_dir.path().join("unreleased/fix-a.md"),
            "---\ntitle: Fix A\ntype: bugfix\n---\n\nBody.\n",
        )
        .unwrap();
        temp_dir
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-03-01"), Ok(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()));
        assert!(parse_date("March").is_err());
    }

    #[test]
    fn test_create_without_yes_writes_nothing() {
        let temp_dir = setup();
        let sink = MemorySink::new();
        let err = create(create_args("v1.0.0", false), temp_dir.path(), &sink).unwrap_err();
        assert!(err.to_string().contains("unapplied changes"));
        assert!(!temp_dir.path().join("releases").exists());
        assert!(sink
            .channel(Channel::Info)
            .iter()
            .any(|line| line.contains("+ fix-a (bugfix)")));
    }

    #[test]
    fn test_create_then_up_to_date() {
        let temp_dir = setup();
        let sink = MemorySink::new();
        create(create_args("v1.0.0", true), temp_dir.path(), &sink).unwrap();
        assert!(temp_dir
            .path()
            .join("releases/v1.0.0/entries/fix-a.md")
            .is_file());

        let again = MemorySink::new();
        create(create_args("v1.0.0", false), temp_dir.path(), &again).unwrap();
        assert_eq!(
            again.channel(Channel::Success),
            vec!["Release v1.0.0 is up to date"]
        );
    }

    #[test]
    fn test_create_reads_intro_file() {
        let temp_dir = setup();
        let intro = temp_dir.path().join("intro.md");
        fs::write(&intro, "Welcome.").unwrap();
        let mut args = create_args("v1.0.0", true);
        args.intro_file = Some(intro);
        create(args, temp_dir.path(), &MemorySink::new()).unwrap();

        let notes = fs::read_to_string(temp_dir.path().join("releases/v1.0.0/notes.md")).unwrap();
        assert!(notes.starts_with("Welcome.\n\n"));
    }

    fn notes_args(version: Option<&str>, format: ExportFormat) -> NotesArgs {
        NotesArgs {
            version: version.map(str::to_string),
            unreleased: false,
            format,
            style: None,
            explicit_links: false,
        }
    }

    #[test]
    fn test_version_reports_latest_release() {
        let temp_dir = setup();
        let err = version(VersionArgs { bare: false }, temp_dir.path(), &MemorySink::new())
            .unwrap_err();
        assert!(err.to_string().contains("No releases found"));

        create(create_args("v1.0.0", true), temp_dir.path(), &MemorySink::new()).unwrap();
        fs::write(
            temp_dir.path().join("unreleased/fix-b.md"),
            "---\ntitle: Fix B\ntype: bugfix\n---\n",
        )
        .unwrap();
        create(create_args("v1.10.0", true), temp_dir.path(), &MemorySink::new()).unwrap();

        let sink = MemorySink::new();
        version(VersionArgs { bare: false }, temp_dir.path(), &sink).unwrap();
        assert_eq!(sink.emitted(), "v1.10.0");

        let bare = MemorySink::new();
        version(VersionArgs { bare: true }, temp_dir.path(), &bare).unwrap();
        assert_eq!(bare.emitted(), "1.10.0");
    }

    #[test]
    fn test_notes_defaults_to_latest_release() {
        let temp_dir = setup();
        create(create_args("v1.0.0", true), temp_dir.path(), &MemorySink::new()).unwrap();

        let sink = MemorySink::new();
        notes(notes_args(None, ExportFormat::Markdown), temp_dir.path(), &sink).unwrap();
        let stored = fs::read_to_string(temp_dir.path().join("releases/v1.0.0/notes.md")).unwrap();
        assert_eq!(format!("{}\n", sink.emitted()), stored);

        let json = MemorySink::new();
        notes(notes_args(Some("v1.0.0"), ExportFormat::Json), temp_dir.path(), &json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json.emitted()).unwrap();
        assert_eq!(value["version"], "v1.0.0");
        assert_eq!(value["entries"][0]["id"], "fix-a");
    }

    #[test]
    fn test_notes_unknown_release_suggests_known() {
        let temp_dir = setup();
        create(create_args("v1.0.0", true), temp_dir.path(), &MemorySink::new()).unwrap();
        let err = notes(
            notes_args(Some("v1.0.1"), ExportFormat::Markdown),
            temp_dir.path(),
            &MemorySink::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Did you mean 'v1.0.0'?"));
    }

    #[test]
    fn test_publish_unknown_release_suggests_known() {
        let temp_dir = setup();
        fs::write(
            temp_dir.path().join("config.yaml"),
            "id: core\nrepository: acme/core\n",
        )
        .unwrap();
        create(create_args("v1.0.0", true), temp_dir.path(), &MemorySink::new()).unwrap();

        let args = PublishArgs {
            version: "v1.0.1".to_string(),
            draft: false,
            prerelease: false,
            no_latest: false,
            tag: false,
            commit: false,
            commit_message: None,
            yes: true,
        };
        let err = publish(args, temp_dir.path(), &MemorySink::new()).unwrap_err();
        assert!(err.to_string().contains("Did you mean 'v1.0.0'?"));
    }
}
