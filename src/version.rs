//! # Release Version Labels
//!
//! Release directories are named by a version label: conventionally a
//! semantic version, optionally prefixed with a single `v` or `V`
//! (`v1.2.3`, `2.0.0`, `V0.4`). This module parses labels into comparable
//! versions, finds the latest release, and computes bumped labels.
//!
//! ## Leniency
//!
//! Labels with fewer than three numeric components (`v1`, `1.2`) are padded
//! with zeros before parsing, so `v1.2` orders like `v1.2.0`. The original
//! label text is always kept for display and for directory names.
//!
//! Labels that do not parse are not errors when scanning existing releases:
//! they simply take no part in numeric ordering or bumping.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::error::{Error, Result};

static PARTIAL_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<major>\d+)(?:\.(?P<minor>\d+))?(?:\.(?P<patch>\d+))?(?P<rest>[-+].*)?$")
        .expect("partial version pattern is valid")
});

/// A parsed release version label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionLabel {
    raw: String,
    prefix: Option<char>,
    version: Version,
}

impl VersionLabel {
    /// Parse a label, accepting an optional `v`/`V` prefix and partial versions.
    pub fn parse(label: &str) -> Result<Self> {
        let raw = label.trim();
        if raw.is_empty() {
            return Err(Error::InvalidVersion {
                label: label.to_string(),
                message: "version cannot be empty".to_string(),
            });
        }

        let (prefix, value) = match raw.chars().next() {
            Some(c @ ('v' | 'V')) => (Some(c), &raw[1..]),
            _ => (None, raw),
        };

        let version = parse_padded(value).ok_or_else(|| Error::InvalidVersion {
            label: raw.to_string(),
            message: "not a semantic version".to_string(),
        })?;

        Ok(Self {
            raw: raw.to_string(),
            prefix,
            version,
        })
    }

    /// Parse a label, returning `None` instead of an error.
    pub fn parse_lenient(label: &str) -> Option<Self> {
        Self::parse(label).ok()
    }

    /// The label exactly as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The prefix letter, if any.
    pub fn prefix(&self) -> Option<char> {
        self.prefix
    }

    /// The numeric version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Compute the next label for a bump, keeping the prefix letter.
    ///
    /// Pre-release and build metadata are dropped.
    pub fn bump(&self, bump: Bump) -> VersionLabel {
        let Version {
            major,
            minor,
            patch,
            ..
        } = self.version;
        let next = match bump {
            Bump::Major => Version::new(major + 1, 0, 0),
            Bump::Minor => Version::new(major, minor + 1, 0),
            Bump::Patch => Version::new(major, minor, patch + 1),
        };
        let raw = match self.prefix {
            Some(p) => format!("{p}{next}"),
            None => next.to_string(),
        };
        VersionLabel {
            raw,
            prefix: self.prefix,
            version: next,
        }
    }
}

fn parse_padded(value: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(value) {
        return Some(version);
    }
    let caps = PARTIAL_VERSION.captures(value)?;
    let padded = format!(
        "{}.{}.{}{}",
        &caps["major"],
        caps.name("minor").map_or("0", |m| m.as_str()),
        caps.name("patch").map_or("0", |m| m.as_str()),
        caps.name("rest").map_or("", |m| m.as_str()),
    );
    Version::parse(&padded).ok()
}

impl fmt::Display for VersionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for VersionLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl PartialOrd for VersionLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version
            .cmp(&other.version)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

/// Which component of a version to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Bump {
    Patch,
    Minor,
    Major,
}

impl Bump {
    pub fn as_str(self) -> &'static str {
        match self {
            Bump::Patch => "patch",
            Bump::Minor => "minor",
            Bump::Major => "major",
        }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the numerically greatest parseable label.
pub fn latest<'a, I>(labels: I) -> Option<VersionLabel>
where
    I: IntoIterator<Item = &'a str>,
{
    labels
        .into_iter()
        .filter_map(VersionLabel::parse_lenient)
        .max()
}

/// Compute the next label by bumping the latest existing one.
pub fn next_version<'a, I>(labels: I, bump: Bump) -> Result<VersionLabel>
where
    I: IntoIterator<Item = &'a str>,
{
    latest(labels)
        .map(|base| base.bump(bump))
        .ok_or_else(|| Error::MissingBaseline {
            bump: bump.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_and_without_prefix() {
        let label = VersionLabel::parse("v1.2.3").unwrap();
        assert_eq!(label.prefix(), Some('v'));
        assert_eq!(label.version(), &Version::new(1, 2, 3));
        assert_eq!(label.to_string(), "v1.2.3");

        let bare = VersionLabel::parse("2.0.0").unwrap();
        assert_eq!(bare.prefix(), None);

        let upper = VersionLabel::parse("V0.4.1").unwrap();
        assert_eq!(upper.prefix(), Some('V'));
    }

    #[test]
    fn test_parse_partial_versions() {
        assert_eq!(
            VersionLabel::parse("v1").unwrap().version(),
            &Version::new(1, 0, 0)
        );
        assert_eq!(
            VersionLabel::parse("1.2").unwrap().version(),
            &Version::new(1, 2, 0)
        );
        assert_eq!(
            VersionLabel::parse("v1.2-rc.1").unwrap().version().pre.as_str(),
            "rc.1"
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            VersionLabel::parse("next"),
            Err(Error::InvalidVersion { .. })
        ));
        assert!(VersionLabel::parse("").is_err());
        assert!(VersionLabel::parse("x1.0.0").is_err());
        assert!(VersionLabel::parse("vv1.0.0").is_err());
    }

    #[test]
    fn test_ordering_is_numeric() {
        let mut labels: Vec<VersionLabel> = ["v10.0.0", "v2.0.0", "v2.0.0-rc.1", "v1.9.9"]
            .iter()
            .map(|l| VersionLabel::parse(l).unwrap())
            .collect();
        labels.sort();
        let ordered: Vec<&str> = labels.iter().map(|l| l.as_str()).collect();
        assert_eq!(ordered, vec!["v1.9.9", "v2.0.0-rc.1", "v2.0.0", "v10.0.0"]);
    }

    #[test]
    fn test_bump_resets_lower_components() {
        let base = VersionLabel::parse("v1.4.7").unwrap();
        assert_eq!(base.bump(Bump::Patch).as_str(), "v1.4.8");
        assert_eq!(base.bump(Bump::Minor).as_str(), "v1.5.0");
        assert_eq!(base.bump(Bump::Major).as_str(), "v2.0.0");
    }

    #[test]
    fn test_bump_drops_prerelease() {
        let base = VersionLabel::parse("1.0.0-beta").unwrap();
        assert_eq!(base.bump(Bump::Patch).as_str(), "1.0.1");
    }

    #[test]
    fn test_latest_ignores_unparseable_labels() {
        let labels = ["v1.0.0", "nightly", "v1.10.0", "v1.2.0"];
        assert_eq!(latest(labels).unwrap().as_str(), "v1.10.0");
        assert!(latest(["nightly"]).is_none());
    }

    #[test]
    fn test_next_version_without_baseline() {
        let result = next_version(std::iter::empty(), Bump::Minor);
        assert!(matches!(result, Err(Error::MissingBaseline { ref bump }) if bump == "minor"));
    }

    #[test]
    fn test_next_version_keeps_prefix_of_latest() {
        let next = next_version(["0.9.0", "v1.0.0"], Bump::Minor).unwrap();
        assert_eq!(next.as_str(), "v1.1.0");
    }
}
