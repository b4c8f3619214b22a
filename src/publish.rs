//! # Release Publishing
//!
//! Publishes an existing release to the configured GitHub repository using
//! the `gh` CLI, optionally committing staged changes and tagging first.
//!
//! Publishing is split into [`plan_publish`], which only queries `git` and
//! `gh`, and [`execute_publish`], which runs the planned steps in order. The
//! command layer shows the plan and asks for confirmation in between.

use std::fmt;
use std::path::PathBuf;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::git::{self, ToolRunner};
use crate::project::Project;

/// What to publish and how.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    pub version: String,
    pub draft: bool,
    pub prerelease: bool,
    /// Pass `--latest=false` when creating the release.
    pub no_latest: bool,
    pub create_tag: bool,
    pub create_commit: bool,
    pub commit_message: Option<String>,
}

/// One external action of a publish run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishStep {
    Commit {
        message: String,
    },
    Tag {
        name: String,
        message: String,
    },
    PushBranch {
        remote: String,
        branch: String,
        remote_branch: String,
    },
    PushTag {
        remote: String,
        tag: String,
    },
    /// A `gh release create` or `gh release edit` invocation.
    Release {
        args: Vec<String>,
    },
}

impl fmt::Display for PublishStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishStep::Commit { message } => write!(f, "git commit -m \"{message}\""),
            PublishStep::Tag { name, message } => {
                write!(f, "git tag -a {name} -m \"{message}\"")
            }
            PublishStep::PushBranch {
                remote,
                branch,
                remote_branch,
            } => write!(f, "git push {remote} {branch}:{remote_branch}"),
            PublishStep::PushTag { remote, tag } => write!(f, "git push {remote} {tag}"),
            PublishStep::Release { args } => write!(f, "gh {}", args.join(" ")),
        }
    }
}

/// Steps to run for one publish, in order.
#[derive(Debug, Clone)]
pub struct PublishPlan {
    pub version: String,
    pub repository: String,
    pub notes_path: PathBuf,
    /// Whether the GitHub release already exists and will be edited.
    pub release_exists: bool,
    pub steps: Vec<PublishStep>,
}

/// Result of running a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// `Some(false)` when the tag already existed and was left alone.
    pub tag_created: Option<bool>,
}

/// Check preconditions and work out the steps of a publish.
///
/// Fails when the project has no repository configured, when the release
/// does not exist or has empty notes, when `--commit` is requested without
/// `--tag` or without staged changes, and when `HEAD` is detached while
/// tagging.
pub fn plan_publish(
    project: &Project,
    options: &PublishOptions,
    runner: &dyn ToolRunner,
) -> Result<PublishPlan> {
    let config = project.config();
    let repository = config
        .repository
        .clone()
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| Error::Config {
            message: "no repository configured for publishing".to_string(),
            hint: Some("set 'repository: owner/name' in config.yaml or package.yaml".to_string()),
        })?;

    let store = project.releases();
    let manifest = store
        .find(&options.version)?
        .ok_or_else(|| Error::UnknownRelease {
            version: options.version.clone(),
        })?;
    let version = manifest.version.clone();

    let notes = store.read_notes(&version)?.unwrap_or_default();
    if notes.trim().is_empty() {
        return Err(Error::Usage {
            message: format!(
                "Release notes for '{version}' are empty\n  hint: run 'shiplog release create {version} --yes' first"
            ),
        });
    }

    let root = project.root();
    let mut steps = Vec::new();

    if options.create_commit {
        if !options.create_tag {
            return Err(Error::Usage {
                message: "--commit requires --tag".to_string(),
            });
        }
        if !git::has_staged_changes(runner, root)? {
            return Err(Error::Usage {
                message: "No staged changes to commit\n  hint: stage changes with 'git add' first"
                    .to_string(),
            });
        }
        steps.push(PublishStep::Commit {
            message: options
                .commit_message
                .clone()
                .unwrap_or_else(|| format!("Release {version}")),
        });
    }

    if options.create_tag {
        let branch = git::current_branch(runner, root)?.ok_or_else(|| Error::Usage {
            message: "cannot push the current branch because HEAD is detached\n  hint: check out a branch before publishing".to_string(),
        })?;
        let (branch_remote, remote_branch) = match git::upstream_branch(runner, root)? {
            Some(upstream) => upstream,
            None => (
                git::select_remote(runner, root, &repository)?,
                branch.clone(),
            ),
        };
        let tag_remote = git::select_remote(runner, root, &repository)?;
        steps.push(PublishStep::Tag {
            name: version.clone(),
            message: format!("Release {version}"),
        });
        steps.push(PublishStep::PushBranch {
            remote: branch_remote,
            branch,
            remote_branch,
        });
        steps.push(PublishStep::PushTag {
            remote: tag_remote,
            tag: version.clone(),
        });
    }

    let release_exists = runner
        .run(
            "gh",
            &[
                "release".to_string(),
                "view".to_string(),
                version.clone(),
                "--repo".to_string(),
                repository.clone(),
            ],
            root,
        )?
        .success();
    debug!("release {} exists on {}: {}", version, repository, release_exists);

    let notes_path = store.notes_path(&version);
    let mut args = vec![
        "release".to_string(),
        if release_exists { "edit" } else { "create" }.to_string(),
        version.clone(),
        "--repo".to_string(),
        repository.clone(),
        "--notes-file".to_string(),
        notes_path.to_string_lossy().into_owned(),
    ];
    if !manifest.title.is_empty() {
        args.push("--title".to_string());
        args.push(manifest.title.clone());
    }
    if !release_exists {
        if options.draft {
            args.push("--draft".to_string());
        }
        if options.prerelease {
            args.push("--prerelease".to_string());
        }
        if options.no_latest {
            args.push("--latest=false".to_string());
        }
    }
    steps.push(PublishStep::Release { args });

    Ok(PublishPlan {
        version,
        repository,
        notes_path,
        release_exists,
        steps,
    })
}

/// Run every step of a plan. The first failing step aborts the run.
pub fn execute_publish(
    project: &Project,
    plan: &PublishPlan,
    runner: &dyn ToolRunner,
) -> Result<PublishReport> {
    let root = project.root();
    let mut report = PublishReport::default();
    for step in &plan.steps {
        debug!("publish step: {}", step);
        match step {
            PublishStep::Commit { message } => git::commit(runner, root, message)?,
            PublishStep::Tag { name, message } => {
                let created = git::create_annotated_tag(runner, root, name, message)?;
                if !created {
                    warn!("git tag {} already exists; skipping creation", name);
                }
                report.tag_created = Some(created);
            }
            PublishStep::PushBranch {
                remote,
                branch,
                remote_branch,
            } => git::push(runner, root, remote, &format!("{branch}:{remote_branch}"))?,
            PublishStep::PushTag { remote, tag } => git::push(runner, root, remote, tag)?,
            PublishStep::Release { args } => {
                git::run_checked(runner, "gh", args, root)?;
            }
        }
    }
    Ok(report)
}
