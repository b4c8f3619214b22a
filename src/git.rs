//! # External Tools
//!
//! Thin wrappers around the system `git` binary, plus the [`ToolRunner`]
//! seam every external invocation goes through. Using the system binary
//! means SSH keys, credential helpers, and `~/.gitconfig` all apply as they
//! would on the command line.
//!
//! A tool that is not on `PATH`, or that exits non-zero when success is
//! required, becomes [`Error::ExternalTool`] carrying the tool's exit
//! status.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::error::{Error, Result};

/// Captured result of one tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    /// Exit status, or `None` when the process was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external tools. Implemented by [`SystemRunner`] for real use and by
/// scripted runners in tests.
pub trait ToolRunner {
    /// Run `tool` with `args` in `cwd`. Only a failure to start the process
    /// is an error; a non-zero exit is reported through [`ToolOutput`].
    fn run(&self, tool: &str, args: &[String], cwd: &Path) -> Result<ToolOutput>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, tool: &str, args: &[String], cwd: &Path) -> Result<ToolOutput> {
        debug!("running {} {}", tool, args.join(" "));
        let output = Command::new(tool)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| Error::ExternalTool {
                tool: tool.to_string(),
                status: None,
                message: if e.kind() == ErrorKind::NotFound {
                    format!("'{tool}' is required but was not found in PATH")
                } else {
                    e.to_string()
                },
            })?;
        Ok(ToolOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Run a tool and require a zero exit status.
pub fn run_checked(
    runner: &dyn ToolRunner,
    tool: &str,
    args: &[String],
    cwd: &Path,
) -> Result<ToolOutput> {
    let output = runner.run(tool, args, cwd)?;
    if output.success() {
        return Ok(output);
    }
    let stderr = output.stderr.trim();
    Err(Error::ExternalTool {
        tool: tool.to_string(),
        status: output.status,
        message: if stderr.is_empty() {
            format!("'{} {}' did not succeed", tool, args.join(" "))
        } else {
            stderr.to_string()
        },
    })
}

fn args<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn git(runner: &dyn ToolRunner, cwd: &Path, items: &[&str]) -> Result<ToolOutput> {
    let items: Vec<String> = items.iter().map(|s| s.to_string()).collect();
    run_checked(runner, "git", &items, cwd)
}

/// Whether the index holds staged changes.
pub fn has_staged_changes(runner: &dyn ToolRunner, cwd: &Path) -> Result<bool> {
    let output = runner.run("git", &args(["diff", "--cached", "--quiet"]), cwd)?;
    match output.status {
        Some(0) => Ok(false),
        Some(1) => Ok(true),
        status => Err(Error::ExternalTool {
            tool: "git".to_string(),
            status,
            message: "failed to check for staged changes".to_string(),
        }),
    }
}

pub fn commit(runner: &dyn ToolRunner, cwd: &Path, message: &str) -> Result<()> {
    git(runner, cwd, &["commit", "-m", message]).map(|_| ())
}

pub fn tag_exists(runner: &dyn ToolRunner, cwd: &Path, tag: &str) -> Result<bool> {
    let output = git(runner, cwd, &["tag", "--list", tag])?;
    Ok(output.stdout.lines().any(|line| line.trim() == tag))
}

/// Create an annotated tag. Returns `false` when the tag already exists.
pub fn create_annotated_tag(
    runner: &dyn ToolRunner,
    cwd: &Path,
    tag: &str,
    message: &str,
) -> Result<bool> {
    if tag_exists(runner, cwd, tag)? {
        return Ok(false);
    }
    git(runner, cwd, &["tag", "-a", tag, "-m", message])?;
    Ok(true)
}

/// The checked-out branch, or `None` for a detached HEAD.
pub fn current_branch(runner: &dyn ToolRunner, cwd: &Path) -> Result<Option<String>> {
    let output = runner.run("git", &args(["rev-parse", "--abbrev-ref", "HEAD"]), cwd)?;
    if !output.success() {
        return Ok(None);
    }
    let branch = output.stdout.trim();
    Ok((!branch.is_empty() && branch != "HEAD").then(|| branch.to_string()))
}

/// The upstream of the current branch as `(remote, branch)`.
pub fn upstream_branch(runner: &dyn ToolRunner, cwd: &Path) -> Result<Option<(String, String)>> {
    let output = runner.run(
        "git",
        &args(["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"]),
        cwd,
    )?;
    if !output.success() {
        return Ok(None);
    }
    Ok(output
        .stdout
        .trim()
        .split_once('/')
        .filter(|(remote, branch)| !remote.is_empty() && !branch.is_empty())
        .map(|(remote, branch)| (remote.to_string(), branch.to_string())))
}

/// Pick the remote whose URL mentions `repository`, else `origin`, else the
/// first configured remote.
pub fn select_remote(runner: &dyn ToolRunner, cwd: &Path, repository: &str) -> Result<String> {
    let output = git(runner, cwd, &["remote", "-v"])?;
    let mut remotes: Vec<(String, String)> = Vec::new();
    for line in output.stdout.lines() {
        let mut parts = line.split_whitespace();
        if let (Some(name), Some(url)) = (parts.next(), parts.next()) {
            remotes.push((name.to_string(), url.to_string()));
        }
    }

    if let Some((name, _)) = remotes.iter().find(|(_, url)| url.contains(repository)) {
        return Ok(name.clone());
    }
    if remotes.iter().any(|(name, _)| name == "origin") {
        return Ok("origin".to_string());
    }
    remotes
        .into_iter()
        .next()
        .map(|(name, _)| name)
        .ok_or_else(|| Error::ExternalTool {
            tool: "git".to_string(),
            status: None,
            message: "no git remotes configured; cannot push release tags".to_string(),
        })
}

pub fn push(runner: &dyn ToolRunner, cwd: &Path, remote: &str, refspec: &str) -> Result<()> {
    git(runner, cwd, &["push", remote, refspec]).map(|_| ())
}
