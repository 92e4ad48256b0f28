//! # dev-chamber
//!
//! Developer workflow tooling for Django projects.
//!
//! The `devc qa` commands run a batch of quality assurance checks against the
//! current branch: pending migrations, migration file names, stale translation
//! catalogs and import order. Every check runs even when an earlier one failed,
//! and every check leaves a clean working tree behind.
//!
//! ## Features
//!
//! - **Branch-aware**: Checks look at what the branch changed relative to the
//!   remote's default branch, not at the whole project
//! - **Guaranteed cleanup**: Tool side effects are stashed after each check,
//!   whether it passed or failed
//! - **Configurable tools**: Commands, sentinels and patterns live in
//!   `devchamber.toml`
//!
//! ## Example
//!
//! ```rust,no_run
//! use dev_chamber::checks::{builtin, Workspace};
//! use dev_chamber::{Config, Executor, GitRepo, Runner};
//!
//! fn main() -> dev_chamber::Result<()> {
//!     let config = Config::load_or_default()?;
//!     let repo = GitRepo::discover(config.git_settings())?;
//!     let executor = Executor::new().cwd(repo.root());
//!
//!     let checks = builtin::build_all(&config.qa.checks, &config.qa)?;
//!     let result = Runner::new(checks).run(
//!         &Workspace::new(&repo, &executor),
//!         &mut std::io::stdout(),
//!     );
//!
//!     std::process::exit(i32::from(result.exit_status()));
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/dev-chamber/0.1.0")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod checks;
pub mod cli;
pub mod config;
pub mod core;

// Re-export main types for convenience
pub use checks::{Check, CheckKind};
pub use config::Config;
pub use core::diff::{Diff, DiffEntry};
pub use core::error::{CheckFailure, Error, Result};
pub use core::executor::{Executor, Shell};
pub use core::git::{GitRepo, Repository};
pub use core::runner::{CheckResult, Outcome, RunResult, Runner};
