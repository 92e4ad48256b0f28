//! Core functionality for dev-chamber.
//!
//! This module contains the main components:
//! - [`git`]: Repository access (default branch, merge-base, diffs, stash)
//! - [`diff`]: Lazily parsed `git diff` output
//! - [`executor`]: External command execution
//! - [`runner`]: Check execution engine
//! - [`error`]: Error types and result handling

pub mod diff;
pub mod error;
pub mod executor;
pub mod git;
pub mod runner;
