//! Import order check.

use crate::checks::{Check, CheckKind, Workspace};
use crate::config::ImportsConfig;
use crate::core::error::CheckFailure;
use crate::core::executor::quote;
use std::collections::HashSet;
use std::path::Path;

/// Fails when the import sorter rewrites any source file the branch touches.
#[derive(Debug, Clone)]
pub struct ImportOrder {
    command: String,
    extensions: Vec<String>,
}

impl ImportOrder {
    /// Message reported for unsorted files.
    pub const FAILURE: &'static str = "Found unsorted import(s) in following files:";

    /// Creates the check from configuration.
    #[must_use]
    pub fn new(config: &ImportsConfig) -> Self {
        Self {
            command: config.command.clone(),
            extensions: config
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
        }
    }

    fn is_source(&self, path: &str) -> bool {
        Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }

    fn sorter_command(&self, paths: &[String]) -> String {
        let args: Vec<String> = paths.iter().map(|path| quote(path)).collect();
        format!("{} -- {}", self.command, args.join(" "))
    }
}

impl Check for ImportOrder {
    fn name(&self) -> &str {
        CheckKind::ImportOrder.title()
    }

    fn execute(&self, ws: &Workspace<'_>) -> std::result::Result<(), CheckFailure> {
        let sources: Vec<String> = ws
            .repo()
            .diff_against_default()?
            .filter_map(|entry| entry.new_path)
            .filter(|path| self.is_source(path))
            .collect();

        if sources.is_empty() {
            tracing::debug!("No changed source files to sort");
            return Ok(());
        }

        ws.shell().run(&self.sorter_command(&sources))?;

        let rewritten: HashSet<String> = ws
            .repo()
            .unstaged_diff()?
            .filter_map(|entry| entry.new_path)
            .collect();

        let unsorted: Vec<&str> = sources
            .iter()
            .filter(|path| rewritten.contains(path.as_str()))
            .map(String::as_str)
            .collect();

        if unsorted.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure::new(Self::FAILURE, unsorted.join("\n")))
        }
    }
}
