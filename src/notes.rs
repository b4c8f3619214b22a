//! # Release Notes Rendering
//!
//! Turns a set of entries into the Markdown stored as a release's `notes.md`.
//!
//! Entries are grouped by kind in a fixed order (breaking, feature, change,
//! bugfix). Within a group they keep the order they were given in, which for
//! a release is the manifest order.
//!
//! Two styles exist:
//!
//! - **standard**: one `###` heading per entry followed by its body and an
//!   italic attribution line;
//! - **compact**: one bullet per entry built from the first paragraph of its
//!   body.
//!
//! Module sections, used when a project aggregates modules, are always
//! compact and are appended after a horizontal rule.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::entry::{Entry, EntryKind};
use crate::error::{Error, Result};

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph pattern is valid"));
static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\s*").expect("line break pattern is valid"));

/// Section order in rendered notes.
pub const SECTION_ORDER: [EntryKind; 4] = [
    EntryKind::Breaking,
    EntryKind::Feature,
    EntryKind::Change,
    EntryKind::Bugfix,
];

/// Rendering style for release notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotesStyle {
    #[default]
    Standard,
    Compact,
}

impl NotesStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            NotesStyle::Standard => "standard",
            NotesStyle::Compact => "compact",
        }
    }

    pub fn is_standard(&self) -> bool {
        *self == NotesStyle::Standard
    }
}

impl fmt::Display for NotesStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotesStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(NotesStyle::Standard),
            "compact" => Ok(NotesStyle::Compact),
            other => Err(Error::Usage {
                message: format!("unknown notes style '{other}', expected standard or compact"),
            }),
        }
    }
}

/// Section heading text for a kind.
pub fn section_title(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Breaking => "Breaking changes",
        EntryKind::Feature => "Features",
        EntryKind::Change => "Changes",
        EntryKind::Bugfix => "Bug fixes",
    }
}

/// Emoji shown next to a kind.
pub fn kind_emoji(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Breaking => "💥",
        EntryKind::Feature => "🚀",
        EntryKind::Change => "🔧",
        EntryKind::Bugfix => "🐞",
    }
}

/// Something that renders entries into a notes document.
pub trait NotesRenderer {
    fn render(&self, entries: &[Entry], config: &Config) -> String;
}

/// Markdown notes renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownNotes {
    pub style: NotesStyle,
    pub include_emoji: bool,
    /// Render pull request references as explicit links to the repository.
    pub explicit_links: bool,
}

impl MarkdownNotes {
    pub fn new(style: NotesStyle) -> Self {
        Self {
            style,
            include_emoji: true,
            explicit_links: false,
        }
    }

    pub fn with_explicit_links(mut self, explicit_links: bool) -> Self {
        self.explicit_links = explicit_links;
        self
    }

    fn heading(&self, kind: EntryKind) -> String {
        if self.include_emoji {
            format!("{} {}", kind_emoji(kind), section_title(kind))
        } else {
            section_title(kind).to_string()
        }
    }

    /// Render with a configurable heading depth for the kind sections.
    fn render_at(&self, entries: &[Entry], config: &Config, depth: usize) -> String {
        let section_marker = "#".repeat(depth);
        let entry_marker = "#".repeat(depth + 1);
        let mut blocks: Vec<String> = Vec::new();

        for kind in SECTION_ORDER {
            let group: Vec<&Entry> = entries.iter().filter(|e| e.kind() == kind).collect();
            if group.is_empty() {
                continue;
            }
            blocks.push(format!("{section_marker} {}", self.heading(kind)));
            match self.style {
                NotesStyle::Standard => {
                    for entry in group {
                        blocks.push(format!("{entry_marker} {}", display_title(entry)));
                        if !entry.header.components.is_empty() {
                            let labels: Vec<String> = entry
                                .header
                                .components
                                .iter()
                                .map(|c| format!("`{c}`"))
                                .collect();
                            blocks.push(format!("**Components:** {}", labels.join(", ")));
                        }
                        if !entry.body.trim().is_empty() {
                            blocks.push(entry.body.trim().to_string());
                        }
                        let attribution = self.attribution(entry, config);
                        if let Some(line) = attribution.sentence() {
                            blocks.push(line);
                        }
                    }
                }
                NotesStyle::Compact => {
                    let bullets: Vec<String> = group
                        .iter()
                        .map(|entry| self.bullet(entry, config))
                        .collect();
                    blocks.push(bullets.join("\n"));
                }
            }
        }

        blocks.join("\n\n")
    }

    fn bullet(&self, entry: &Entry, config: &Config) -> String {
        let excerpt = extract_excerpt(&entry.body);
        let text = if excerpt.is_empty() {
            display_title(entry).to_string()
        } else {
            excerpt
        };
        let mut bullet = if entry.header.components.is_empty() {
            format!("- {text}")
        } else {
            format!("- **{}**: {text}", entry.header.components.join(", "))
        };
        if let Some(suffix) = self.attribution(entry, config).suffix() {
            bullet.push_str(&format!(" ({suffix})"));
        }
        bullet
    }

    fn attribution(&self, entry: &Entry, config: &Config) -> Attribution {
        let authors: Vec<String> = entry.header.authors.iter().map(|a| author_handle(a)).collect();
        let prs: Vec<String> = entry
            .header
            .prs
            .iter()
            .map(|pr| match (&config.repository, self.explicit_links) {
                (Some(repo), true) => format!("[#{pr}](https://github.com/{repo}/pull/{pr})"),
                _ => format!("#{pr}"),
            })
            .collect();
        Attribution {
            authors: join_with_conjunction(&authors),
            prs: join_with_conjunction(&prs),
        }
    }
}

impl NotesRenderer for MarkdownNotes {
    fn render(&self, entries: &[Entry], config: &Config) -> String {
        self.render_at(entries, config, 2)
    }
}

struct Attribution {
    authors: String,
    prs: String,
}

impl Attribution {
    fn parts(&self, by: &str) -> Vec<String> {
        let mut parts = Vec::new();
        if !self.authors.is_empty() {
            parts.push(format!("{by} {}", self.authors));
        }
        if !self.prs.is_empty() {
            parts.push(format!("in {}", self.prs));
        }
        parts
    }

    /// `*By @alice in #12.*`
    fn sentence(&self) -> Option<String> {
        let parts = self.parts("By");
        (!parts.is_empty()).then(|| format!("*{}.*", parts.join(" ")))
    }

    /// `by @alice in #12`
    fn suffix(&self) -> Option<String> {
        let parts = self.parts("by");
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

fn display_title(entry: &Entry) -> &str {
    if entry.title().trim().is_empty() {
        "Untitled"
    } else {
        entry.title()
    }
}

/// Forge handle for an author. Names with spaces are shown verbatim.
fn author_handle(author: &str) -> String {
    let author = author.trim().trim_start_matches('@');
    if author.contains(char::is_whitespace) {
        author.to_string()
    } else {
        format!("@{author}")
    }
}

/// Join items as `a`, `a and b`, or `a, b, and c`.
pub fn join_with_conjunction(items: &[String]) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.as_str())
        .filter(|s| !s.is_empty())
        .collect();
    match items.as_slice() {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{a} and {b}"),
        [init @ .., last] => format!("{}, and {last}", init.join(", ")),
    }
}

/// The first paragraph of a Markdown body collapsed onto one line.
pub fn extract_excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let first = PARAGRAPH_BREAK
        .split(trimmed)
        .next()
        .unwrap_or(trimmed)
        .trim();
    LINE_BREAK.replace_all(first, " ").trim().to_string()
}

/// Join an optional intro and rendered notes with a blank line.
pub fn compose_release_document(intro: Option<&str>, notes: &str) -> String {
    let parts: Vec<&str> = [intro.unwrap_or_default().trim(), notes.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    parts.join("\n\n")
}

/// Entries a module shipped, ready to be appended to parent notes.
#[derive(Debug, Clone)]
pub struct ModuleSection<'a> {
    pub config: &'a Config,
    pub version: Option<&'a str>,
    pub entries: &'a [Entry],
}

/// Append module sections after a horizontal rule.
///
/// Modules without entries produce no section. Returns the document
/// unchanged when no section remains.
pub fn append_module_sections(document: &str, sections: &[ModuleSection<'_>]) -> String {
    let renderer = MarkdownNotes::new(NotesStyle::Compact);
    let rendered: Vec<String> = sections
        .iter()
        .filter(|section| !section.entries.is_empty())
        .map(|section| {
            let header = match section.version {
                Some(version) if !version.is_empty() => {
                    format!("## {} {}", section.config.name, version)
                }
                _ => format!("## {}", section.config.name),
            };
            let body = renderer.render_at(section.entries, section.config, 3);
            format!("{header}\n\n{body}")
        })
        .collect();

    if rendered.is_empty() {
        return document.to_string();
    }
    let modules = rendered.join("\n\n");
    if document.trim().is_empty() {
        format!("---\n\n{modules}")
    } else {
        format!("{}\n\n---\n\n{modules}", document.trim_end())
    }
}
