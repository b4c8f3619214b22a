//! # Project Statistics
//!
//! Release and entry counts for a project, as shown by `shiplog stats`.
//!
//! Release cadence is an exponentially weighted mean of releases per
//! calendar month. Each month that saw a release contributes its count with
//! weight `0.7^n`, where `n` is how many months before the current one it
//! lies. Cadence exists only when the first and latest release dates differ.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::entry::{Entry, EntryKind};
use crate::error::Result;
use crate::project::Project;

const CADENCE_DECAY: f64 = 0.7;

/// Release facts for one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReleaseStats {
    pub count: usize,
    /// Date of the latest release.
    pub last: Option<NaiveDate>,
    /// Days between the latest release and today.
    pub age_days: Option<i64>,
    /// Version label of the latest release.
    pub latest: Option<String>,
    #[serde(skip)]
    pub latest_entries: Option<usize>,
    #[serde(skip)]
    pub first: Option<NaiveDate>,
    /// Rounded releases per month.
    #[serde(skip)]
    pub cadence: Option<u64>,
}

impl ReleaseStats {
    /// Days between the first and the latest release.
    pub fn span_days(&self) -> Option<i64> {
        match (self.first, self.last) {
            (Some(first), Some(last)) if first != last => Some((last - first).num_days()),
            _ => None,
        }
    }
}

/// Entry counts for one project.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntryStats {
    pub total: usize,
    pub shipped: usize,
    pub unreleased: usize,
    /// Shipped and unreleased entries per kind.
    #[serde(flatten)]
    pub by_kind: BTreeMap<EntryKind, usize>,
}

impl EntryStats {
    pub fn count(&self, kind: EntryKind) -> usize {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Rounded share of `count` in the total.
    pub fn percent(&self, count: usize) -> usize {
        if self.total == 0 {
            0
        } else {
            (count as f64 * 100.0 / self.total as f64).round() as usize
        }
    }
}

/// Statistics of one project or module.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub id: String,
    pub name: String,
    /// Path relative to the parent project, `.` for the parent itself.
    pub path: String,
    pub releases: ReleaseStats,
    pub entries: EntryStats,
}

/// Gather statistics for `project`, with ages measured against `today`.
pub fn collect(project: &Project, path: &str, today: NaiveDate) -> Result<ProjectStats> {
    let config = project.config();
    let store = project.releases();
    let manifests = store.list()?;

    let mut releases = ReleaseStats {
        count: manifests.len(),
        ..Default::default()
    };
    if let Some(label) = project.latest_version()? {
        if let Some(latest) = manifests.iter().find(|m| m.version == label.as_str()) {
            releases.last = Some(latest.created);
            releases.age_days = Some((today - latest.created).num_days());
            releases.latest = Some(latest.version.clone());
            releases.latest_entries = Some(latest.entries.len());
        }
    }
    let dates: Vec<NaiveDate> = manifests.iter().map(|m| m.created).collect();
    releases.first = dates.iter().min().copied();
    if releases.span_days().is_some() {
        releases.cadence = cadence(&dates, today);
    }

    let mut shipped: BTreeMap<String, Entry> = BTreeMap::new();
    for manifest in &manifests {
        for entry in store.load_entries_lenient(manifest)? {
            shipped.entry(entry.id.clone()).or_insert(entry);
        }
    }
    let unreleased = project.unused_entries()?;

    let mut entries = EntryStats {
        total: shipped.len() + unreleased.len(),
        shipped: shipped.len(),
        unreleased: unreleased.len(),
        by_kind: BTreeMap::new(),
    };
    for entry in shipped.values().chain(unreleased.iter()) {
        *entries.by_kind.entry(entry.kind()).or_default() += 1;
    }

    log::debug!(
        "stats for {}: {} releases, {} entries",
        config.id,
        releases.count,
        entries.total
    );

    Ok(ProjectStats {
        id: config.id.clone(),
        name: config.name.clone(),
        path: path.to_string(),
        releases,
        entries,
    })
}

/// Weighted releases per month, rounded.
pub fn cadence(dates: &[NaiveDate], today: NaiveDate) -> Option<u64> {
    let mut by_month: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for date in dates {
        *by_month.entry((date.year(), date.month())).or_default() += 1;
    }

    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for ((year, month), count) in by_month {
        let months_ago =
            (today.year() - year) * 12 + (today.month() as i32 - month as i32);
        let weight = CADENCE_DECAY.powi(months_ago);
        weighted_sum += count as f64 * weight;
        weight_total += weight;
    }
    (weight_total > 0.0).then(|| (weighted_sum / weight_total).round() as u64)
}

/// Compact age such as `today`, `3 days`, `2 weeks`, `1 month`, `4 years`.
pub fn format_age(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "1 day".to_string(),
        2..=6 => format!("{days} days"),
        7..=13 => "1 week".to_string(),
        14..=29 => format!("{} weeks", days / 7),
        30..=59 => "1 month".to_string(),
        60..=364 => format!("{} months", days / 30),
        365..=729 => "1 year".to_string(),
        _ if days >= 730 => format!("{} years", days / 365),
        _ => format!("{days} days"),
    }
}
