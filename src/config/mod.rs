//! Configuration handling for dev-chamber.
//!
//! This module provides configuration loading and validation,
//! supporting `devchamber.toml` files and sensible defaults for Django
//! projects.

use crate::checks::CheckKind;
use crate::core::error::{Error, Result};
use crate::core::git::GitSettings;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "devchamber.toml";

/// Directory under the user config dir holding the fallback configuration.
pub const USER_CONFIG_DIR: &str = "devchamber";

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository settings.
    pub git: GitConfig,
    /// Quality assurance settings.
    pub qa: QaConfig,
}

impl Config {
    /// Loads configuration from the default location.
    pub fn load() -> Result<Self> {
        let path = Self::find_config_file()?;
        Self::load_from(&path)
    }

    /// Loads configuration or returns defaults if not found.
    pub fn load_or_default() -> Result<Self> {
        match Self::find_config_file() {
            Ok(path) => Self::load_from(&path),
            Err(Error::ConfigNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| Error::io("read config", e))?;
        let config = Self::from_toml(&content)?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::config_parse_with_source("Failed to parse TOML", e))?;

        config.validate()?;

        Ok(config)
    }

    /// Finds the configuration file.
    ///
    /// Searches the current directory and its parents, then the user config
    /// directory.
    pub fn find_config_file() -> Result<PathBuf> {
        let cwd = std::env::current_dir().map_err(|e| Error::io("get current dir", e))?;

        let mut current = cwd.as_path();
        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if let Some(user_config) = Self::user_config_file() {
            if user_config.exists() {
                return Ok(user_config);
            }
        }

        Err(Error::ConfigNotFound {
            path: cwd.join(CONFIG_FILE_NAME),
        })
    }

    /// Path of the per-user fallback configuration file.
    #[must_use]
    pub fn user_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join("config.toml"))
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.git.remote.trim().is_empty() {
            return Err(Error::config_invalid("git.remote", "must not be empty"));
        }

        let mut seen = HashSet::new();
        for kind in &self.qa.checks {
            if !seen.insert(kind) {
                return Err(Error::config_invalid(
                    "qa.checks",
                    format!("check '{}' is listed more than once", kind.slug()),
                ));
            }
        }

        let commands = [
            ("qa.migrations.command", &self.qa.migrations.command),
            ("qa.translations.command", &self.qa.translations.command),
            ("qa.imports.command", &self.qa.imports.command),
        ];
        for (field, command) in commands {
            if command.trim().is_empty() {
                return Err(Error::config_invalid(field, "must not be empty"));
            }
        }

        let file_pattern = compile_pattern("qa.migrations.file_pattern", &self.qa.migrations.file_pattern)?;
        if file_pattern.captures_len() < 2 {
            return Err(Error::config_invalid(
                "qa.migrations.file_pattern",
                "must contain a capture group for the migration name",
            ));
        }
        compile_pattern("qa.migrations.name_pattern", &self.qa.migrations.name_pattern)?;

        if self.qa.translations.catalog_file.trim().is_empty() {
            return Err(Error::config_invalid(
                "qa.translations.catalog_file",
                "must not be empty",
            ));
        }

        if self.qa.imports.extensions.is_empty() {
            return Err(Error::config_invalid(
                "qa.imports.extensions",
                "must list at least one extension",
            ));
        }

        Ok(())
    }

    /// Repository settings derived from this configuration.
    #[must_use]
    pub fn git_settings(&self) -> GitSettings {
        GitSettings {
            remote: self.git.remote.clone(),
        }
    }

    /// Generates default configuration as a string.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Self::default()).map_err(|e| Error::Internal {
            message: format!("Failed to serialize config: {e}"),
        })
    }
}

/// Compiles a configured regular expression.
pub(crate) fn compile_pattern(field: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::config_invalid(field, format!("invalid regex '{pattern}': {e}")))
}

/// Repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitConfig {
    /// Remote whose `HEAD` names the default branch.
    pub remote: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        Self {
            remote: GitSettings::default().remote,
        }
    }
}

/// Quality assurance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaConfig {
    /// Checks run by `qa all`, in order.
    pub checks: Vec<CheckKind>,
    /// Migration checks.
    pub migrations: MigrationsConfig,
    /// Translation catalog check.
    pub translations: TranslationsConfig,
    /// Import order check.
    pub imports: ImportsConfig,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            checks: CheckKind::ALL.to_vec(),
            migrations: MigrationsConfig::default(),
            translations: TranslationsConfig::default(),
            imports: ImportsConfig::default(),
        }
    }
}

/// Settings shared by the two migration checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationsConfig {
    /// Command printing the migrations that would be generated.
    pub command: String,
    /// Last output line when no migration is needed.
    pub sentinel: String,
    /// Pattern selecting migration files; group 1 is the migration name.
    pub file_pattern: String,
    /// Pattern the migration name must match.
    pub name_pattern: String,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            command: "python manage.py makemigrations --dry-run".to_string(),
            sentinel: "No changes detected".to_string(),
            file_pattern: r"migrations/([^/]+)\.py$".to_string(),
            name_pattern: r"^[0-9]{4}$".to_string(),
        }
    }
}

/// Translation catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationsConfig {
    /// Command regenerating message catalogs in place.
    pub command: String,
    /// File name suffix identifying catalogs.
    pub catalog_file: String,
}

impl Default for TranslationsConfig {
    fn default() -> Self {
        Self {
            command: "python manage.py makemessages --all".to_string(),
            catalog_file: "django.po".to_string(),
        }
    }
}

/// Import sorter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportsConfig {
    /// Sorter command; changed file paths are appended.
    pub command: String,
    /// Extensions (without the dot) of files handed to the sorter.
    pub extensions: Vec<String>,
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            command: "isort".to_string(),
            extensions: vec!["py".to_string()],
        }
    }
}
