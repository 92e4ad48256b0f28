//! Quality assurance checks.
//!
//! A [`Check`] is a named rule with two phases: [`Check::execute`] evaluates
//! the rule and [`Check::cleanup`] restores the working tree afterwards.
//! [`Check::run`] ties them together and guarantees that cleanup happens on
//! every exit path.
//!
//! The concrete checks are registered explicitly in [`CheckKind`].

pub mod builtin;
pub mod imports;
pub mod migrations;
pub mod translations;

pub use builtin::CheckKind;
pub use imports::ImportOrder;
pub use migrations::{MigrationFilenames, MissingMigrations};
pub use translations::MissingTranslations;

use crate::core::error::{CheckFailure, Result};
use crate::core::executor::Shell;
use crate::core::git::Repository;
use std::fmt;

/// What a check gets to work with.
#[derive(Clone, Copy)]
pub struct Workspace<'a> {
    repo: &'a dyn Repository,
    shell: &'a dyn Shell,
}

impl<'a> Workspace<'a> {
    /// Creates a workspace over a repository and a shell.
    pub fn new(repo: &'a dyn Repository, shell: &'a dyn Shell) -> Self {
        Self { repo, shell }
    }

    /// The repository under check.
    #[must_use]
    pub fn repo(&self) -> &'a dyn Repository {
        self.repo
    }

    /// The shell external tools run in.
    #[must_use]
    pub fn shell(&self) -> &'a dyn Shell {
        self.shell
    }
}

impl fmt::Debug for Workspace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace").finish_non_exhaustive()
    }
}

/// A single quality assurance rule.
pub trait Check {
    /// Human-readable name, unique within a run.
    fn name(&self) -> &str;

    /// Evaluates the rule.
    fn execute(&self, ws: &Workspace<'_>) -> std::result::Result<(), CheckFailure>;

    /// Restores the working tree after [`Check::execute`].
    ///
    /// Stashes every uncommitted change to tracked files.
    fn cleanup(&self, ws: &Workspace<'_>) -> Result<()> {
        ws.repo()
            .stash_working_tree(&format!("devc qa: {}", self.name()))
    }

    /// Executes the check, then cleans up whatever the outcome.
    ///
    /// Consumes the check: a check runs at most once. Cleanup errors are
    /// logged and never replace the execution outcome.
    fn run(self: Box<Self>, ws: &Workspace<'_>) -> std::result::Result<(), CheckFailure> {
        let guard = CleanupGuard { check: &*self, ws };
        let outcome = self.execute(ws);
        drop(guard);
        outcome
    }
}

impl fmt::Debug for dyn Check + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check").field("name", &self.name()).finish()
    }
}

/// Runs [`Check::cleanup`] when dropped.
///
/// That includes unwinding from a panic in builds that unwind; release builds
/// abort on panic and skip cleanup.
struct CleanupGuard<'a, C: Check + ?Sized> {
    check: &'a C,
    ws: &'a Workspace<'a>,
}

impl<C: Check + ?Sized> Drop for CleanupGuard<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.check.cleanup(self.ws) {
            tracing::warn!(
                check = %self.check.name(),
                error = %e,
                "Cleanup failed; the working tree may contain changes made by the check"
            );
        }
    }
}
