//! Git repository operations.
//!
//! [`GitRepo`] shells out to `git` to resolve the remote's default branch,
//! compute the merge-base with the active branch, extract diffs and stash
//! changes left behind by a check. Checks only see the [`Repository`] trait.

use crate::core::diff::Diff;
use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Settings for repository access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitSettings {
    /// Remote whose `HEAD` names the default branch.
    pub remote: String,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
        }
    }
}

/// Read access to a working copy, plus the stash used for cleanup.
#[cfg_attr(test, mockall::automock)]
pub trait Repository {
    /// Name of the branch the remote's `HEAD` symbolic reference points to.
    fn default_branch(&self) -> Result<String>;

    /// Changes between the merge-base of the active branch and the remote
    /// default branch, and the active branch's tip.
    fn diff_against_default(&self) -> Result<Diff>;

    /// Changes between the index and the working tree. Untracked files are
    /// not included.
    fn unstaged_diff(&self) -> Result<Diff>;

    /// Moves uncommitted changes to tracked files onto the stash.
    fn stash_working_tree(&self, message: &str) -> Result<()>;
}

/// Represents a Git repository.
#[derive(Debug, Clone)]
pub struct GitRepo {
    /// Root directory of the repository (the working tree top level).
    root: PathBuf,
    settings: GitSettings,
}

impl GitRepo {
    /// Discovers the Git repository from the current directory.
    pub fn discover(settings: GitSettings) -> Result<Self> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;
        Self::discover_from(&cwd, settings)
    }

    /// Discovers the Git repository from a specific path.
    pub fn discover_from(path: &Path, settings: GitSettings) -> Result<Self> {
        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .map_err(|e| Error::io("run git rev-parse", e))?;

        if !output.status.success() {
            return Err(Error::NotGitRepo);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let root = stdout
            .lines()
            .next()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .ok_or(Error::NotGitRepo)?;

        Ok(Self { root, settings })
    }

    /// Returns the root directory of the repository.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the name of the checked-out branch.
    ///
    /// Fails on a detached `HEAD`.
    pub fn active_branch(&self) -> Result<String> {
        let branch = self
            .git("active branch", &["symbolic-ref", "--quiet", "--short", "HEAD"])
            .map_err(|_| Error::git("active branch", "HEAD is detached or unborn"))?;
        Ok(branch.trim().to_string())
    }

    /// Returns the merge-base of the active branch and the remote default branch.
    pub fn merge_base(&self) -> Result<String> {
        let branch = self.active_branch()?;
        let default = self.default_branch()?;
        let target = format!("refs/remotes/{}/{default}", self.settings.remote);

        let base = self.git("merge-base", &["merge-base", branch.as_str(), target.as_str()])?;
        let base = base.trim();
        if base.is_empty() {
            return Err(Error::git(
                "merge-base",
                format!("no common ancestor between {branch} and {target}"),
            ));
        }

        tracing::debug!(branch = %branch, target = %target, base = %base, "Resolved merge-base");
        Ok(base.to_string())
    }

    /// Checks if tracked files have uncommitted changes.
    pub fn has_uncommitted_changes(&self) -> Result<bool> {
        let status = self.git("status", &["status", "--porcelain", "--untracked-files=no"])?;
        Ok(!status.trim().is_empty())
    }

    /// Runs `git diff` with stable, parseable output and the given revisions.
    fn diff(&self, revisions: &[&str]) -> Result<Diff> {
        let mut args = vec![
            "-c",
            "core.quotePath=false",
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--no-relative",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            "-M",
        ];
        args.extend_from_slice(revisions);
        self.git("diff", &args).map(Diff::parse)
    }

    /// Runs git in the repository root and returns its stdout.
    fn git(&self, operation: &str, args: &[&str]) -> Result<String> {
        tracing::debug!(args = ?args, "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| Error::io(format!("run git {operation}"), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::git(operation, stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Repository for GitRepo {
    fn default_branch(&self) -> Result<String> {
        let remote = &self.settings.remote;
        let head = format!("refs/remotes/{remote}/HEAD");

        let target = self
            .git("symbolic-ref", &["symbolic-ref", "--quiet", head.as_str()])
            .map_err(|_| Error::resolution(remote, format!("{head} is missing")))?;
        let target = target.trim();

        let prefix = format!("refs/remotes/{remote}/");
        match target.strip_prefix(&prefix) {
            Some(branch) if !branch.is_empty() => Ok(branch.to_string()),
            _ => Err(Error::resolution(
                remote,
                format!("{head} points to unexpected reference '{target}'"),
            )),
        }
    }

    fn diff_against_default(&self) -> Result<Diff> {
        let base = self.merge_base()?;
        let tip = format!("refs/heads/{}", self.active_branch()?);
        self.diff(&[base.as_str(), tip.as_str()])
    }

    fn unstaged_diff(&self) -> Result<Diff> {
        self.diff(&[])
    }

    fn stash_working_tree(&self, message: &str) -> Result<()> {
        if !self.has_uncommitted_changes()? {
            tracing::debug!("Working tree clean, nothing to stash");
            return Ok(());
        }

        self.git("stash", &["stash", "push", "--message", message])?;
        tracing::debug!(message = %message, "Stashed working tree changes");
        Ok(())
    }
}
