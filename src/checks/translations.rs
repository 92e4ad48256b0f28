//! Translation catalog check.

use crate::checks::{Check, CheckKind, Workspace};
use crate::config::TranslationsConfig;
use crate::core::error::{CheckFailure, Error, Result};
use regex::Regex;

/// Patch lines that add or remove a message entry.
const ENTRY_MARKER: &str = r"(?m)^[+-](msgid|msgstr)";

/// Fails when regenerating the message catalogs changes any message entry.
///
/// Only `msgid`/`msgstr` lines count; reference comments and header dates
/// change on every regeneration and are ignored.
#[derive(Debug, Clone)]
pub struct MissingTranslations {
    command: String,
    catalog_file: String,
    marker: Regex,
}

impl MissingTranslations {
    /// Message reported when catalogs are out of date.
    pub const FAILURE: &'static str = "Found changes in following translation file(s):";

    /// Creates the check from configuration.
    pub fn new(config: &TranslationsConfig) -> Result<Self> {
        let marker = Regex::new(ENTRY_MARKER).map_err(|e| Error::Internal {
            message: format!("invalid catalog entry pattern: {e}"),
        })?;

        Ok(Self {
            command: config.command.clone(),
            catalog_file: config.catalog_file.clone(),
            marker,
        })
    }

    fn is_catalog(&self, path: &str) -> bool {
        path.ends_with(&self.catalog_file)
    }
}

impl Check for MissingTranslations {
    fn name(&self) -> &str {
        CheckKind::MissingTranslations.title()
    }

    fn execute(&self, ws: &Workspace<'_>) -> std::result::Result<(), CheckFailure> {
        ws.shell().run(&self.command)?;

        let changed: Vec<String> = ws
            .repo()
            .unstaged_diff()?
            .filter(|entry| entry.new_path.as_deref().is_some_and(|path| self.is_catalog(path)))
            .filter(|entry| self.marker.is_match(&entry.patch))
            .map(|entry| format!("{}\n{}", entry.path(), entry.patch.trim_end()))
            .collect();

        if changed.is_empty() {
            Ok(())
        } else {
            tracing::debug!(files = changed.len(), "Catalog entries changed");
            Err(CheckFailure::new(Self::FAILURE, changed.join("\n")))
        }
    }
}
