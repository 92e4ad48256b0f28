//! Built-in check registry.
//!
//! Every check dev-chamber knows about is listed in [`CheckKind`]; nothing is
//! discovered implicitly.

use crate::checks::{
    Check, ImportOrder, MigrationFilenames, MissingMigrations, MissingTranslations,
};
use crate::config::QaConfig;
use crate::core::error::Result;
use serde::{Deserialize, Serialize};

/// Command-line and configuration names of built-in checks.
pub mod names {
    /// Migration generator reports no pending migrations.
    pub const MISSING_MIGRATIONS: &str = "missing-migrations";
    /// New migration files follow the naming convention.
    pub const MIGRATION_FILENAMES: &str = "migration-filenames";
    /// Regenerating message catalogs changes no entries.
    pub const MISSING_TRANSLATIONS: &str = "missing-translations";
    /// Import sorter leaves changed files untouched.
    pub const IMPORT_ORDER: &str = "import-order";
}

/// A registered QA check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    /// Migration generator reports no pending migrations.
    MissingMigrations,
    /// New migration files follow the naming convention.
    MigrationFilenames,
    /// Regenerating message catalogs changes no entries.
    MissingTranslations,
    /// Import sorter leaves the branch's changed files untouched.
    ImportOrder,
}

impl CheckKind {
    /// All checks, in the order `qa all` runs them by default.
    pub const ALL: [Self; 4] = [
        Self::MissingMigrations,
        Self::MigrationFilenames,
        Self::MissingTranslations,
        Self::ImportOrder,
    ];

    /// Command-line name.
    #[must_use]
    pub const fn slug(&self) -> &'static str {
        match self {
            Self::MissingMigrations => names::MISSING_MIGRATIONS,
            Self::MigrationFilenames => names::MIGRATION_FILENAMES,
            Self::MissingTranslations => names::MISSING_TRANSLATIONS,
            Self::ImportOrder => names::IMPORT_ORDER,
        }
    }

    /// Name shown in reports.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::MissingMigrations => "Check missing migrations",
            Self::MigrationFilenames => "Check migration filenames",
            Self::MissingTranslations => "Check missing translations",
            Self::ImportOrder => "Check import order",
        }
    }

    /// The external command this check runs, if any.
    #[must_use]
    pub fn tool<'c>(&self, config: &'c QaConfig) -> Option<&'c str> {
        match self {
            Self::MissingMigrations => Some(&config.migrations.command),
            Self::MigrationFilenames => None,
            Self::MissingTranslations => Some(&config.translations.command),
            Self::ImportOrder => Some(&config.imports.command),
        }
    }

    /// Constructs a fresh check instance.
    pub fn build(self, config: &QaConfig) -> Result<Box<dyn Check>> {
        let check: Box<dyn Check> = match self {
            Self::MissingMigrations => Box::new(MissingMigrations::new(&config.migrations)),
            Self::MigrationFilenames => Box::new(MigrationFilenames::new(&config.migrations)?),
            Self::MissingTranslations => Box::new(MissingTranslations::new(&config.translations)?),
            Self::ImportOrder => Box::new(ImportOrder::new(&config.imports)),
        };
        Ok(check)
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

/// Builds fresh instances of the given checks, in order.
pub fn build_all(kinds: &[CheckKind], config: &QaConfig) -> Result<Vec<Box<dyn Check>>> {
    kinds.iter().map(|kind| kind.build(config)).collect()
}
