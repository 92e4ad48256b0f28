//! Django migration checks.
//!
//! [`MissingMigrations`] asks the migration generator whether model changes
//! are still waiting for a migration. [`MigrationFilenames`] enforces the
//! naming convention on migration files added by the current branch.

use crate::checks::{Check, CheckKind, Workspace};
use crate::config::{compile_pattern, MigrationsConfig};
use crate::core::error::{CheckFailure, Result};
use regex::Regex;

/// Fails when the migration generator would create new migrations.
#[derive(Debug, Clone)]
pub struct MissingMigrations {
    command: String,
    sentinel: String,
}

impl MissingMigrations {
    /// Message reported when migrations are pending.
    pub const FAILURE: &'static str = "Found missing migration(s)!";

    /// Creates the check from configuration.
    #[must_use]
    pub fn new(config: &MigrationsConfig) -> Self {
        Self {
            command: config.command.clone(),
            sentinel: config.sentinel.trim().to_string(),
        }
    }
}

impl Check for MissingMigrations {
    fn name(&self) -> &str {
        CheckKind::MissingMigrations.title()
    }

    fn execute(&self, ws: &Workspace<'_>) -> std::result::Result<(), CheckFailure> {
        let output = ws.shell().run(&self.command)?;
        let stdout = output.stdout.trim();
        let last_line = stdout.lines().next_back().unwrap_or_default().trim();

        if last_line == self.sentinel {
            Ok(())
        } else {
            tracing::debug!(last_line = %last_line, "Migration generator reported changes");
            Err(CheckFailure::new(Self::FAILURE, stdout))
        }
    }
}

/// Fails when the branch adds a migration file with a non-conforming name.
#[derive(Debug, Clone)]
pub struct MigrationFilenames {
    file_pattern: Regex,
    name_pattern: Regex,
}

impl MigrationFilenames {
    /// Message reported for badly named migrations.
    pub const FAILURE: &'static str = "Found wrongly named migration file:";

    /// Creates the check from configuration.
    pub fn new(config: &MigrationsConfig) -> Result<Self> {
        Ok(Self {
            file_pattern: compile_pattern("qa.migrations.file_pattern", &config.file_pattern)?,
            name_pattern: compile_pattern("qa.migrations.name_pattern", &config.name_pattern)?,
        })
    }

    /// Returns true if `path` is a migration file whose name breaks the convention.
    fn is_misnamed(&self, path: &str) -> bool {
        self.file_pattern
            .captures(path)
            .and_then(|captures| captures.get(1))
            .is_some_and(|name| !self.name_pattern.is_match(name.as_str()))
    }
}

impl Check for MigrationFilenames {
    fn name(&self) -> &str {
        CheckKind::MigrationFilenames.title()
    }

    fn execute(&self, ws: &Workspace<'_>) -> std::result::Result<(), CheckFailure> {
        let offenders: Vec<String> = ws
            .repo()
            .diff_against_default()?
            .filter(|entry| entry.new_file)
            .filter_map(|entry| entry.new_path)
            .filter(|path| self.is_misnamed(path))
            .collect();

        if offenders.is_empty() {
            Ok(())
        } else {
            Err(CheckFailure::new(Self::FAILURE, offenders.join("\n")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::{added_files, modified_files, repo_with_cleanup};
    use crate::core::diff::Diff;
    use crate::core::error::Error;
    use crate::core::executor::{CommandOutput, MockShell};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn shell_printing(stdout: &'static str) -> MockShell {
        let mut shell = MockShell::new();
        shell
            .expect_run()
            .withf(|command| command.trim() == "python manage.py makemigrations --dry-run")
            .times(1)
            .returning(move |_| Ok(CommandOutput::from_stdout(stdout)));
        shell
    }

    // =========================================================================
    // MissingMigrations tests
    // =========================================================================

    #[test]
    fn test_no_changes_detected_passes() {
        let repo = repo_with_cleanup();
        let shell = shell_printing("No changes detected\n");
        let check = MissingMigrations::new(&MigrationsConfig::default());

        assert_eq!(check.execute(&Workspace::new(&repo, &shell)), Ok(()));
    }

    #[test]
    fn test_sentinel_only_counts_on_last_line() {
        let repo = repo_with_cleanup();
        let shell = shell_printing("System check identified some issues\nNo changes detected\n\n");
        let check = MissingMigrations::new(&MigrationsConfig::default());

        assert!(check.execute(&Workspace::new(&repo, &shell)).is_ok());
    }

    #[test]
    fn test_pending_migration_fails_with_full_output() {
        let stdout = "Migrations for 'app':\n  app/migrations/0002.py\n    - Add field x\nMigrations for \"app\": 0001_initial.py\n";
        let repo = repo_with_cleanup();
        let shell = shell_printing(stdout);
        let check = MissingMigrations::new(&MigrationsConfig::default());

        let failure = check
            .execute(&Workspace::new(&repo, &shell))
            .expect_err("should fail");
        assert_eq!(failure.message(), "Found missing migration(s)!");
        assert_eq!(failure.output(), stdout.trim());
    }

    #[test]
    fn test_empty_output_fails() {
        let repo = repo_with_cleanup();
        let shell = shell_printing("");
        let check = MissingMigrations::new(&MigrationsConfig::default());

        assert!(check.execute(&Workspace::new(&repo, &shell)).is_err());
    }

    #[test]
    fn test_command_error_becomes_failure() {
        let repo = repo_with_cleanup();
        let mut shell = MockShell::new();
        shell.expect_run().returning(|command| {
            Err(Error::Command {
                command: command.to_string(),
                exit_code: 1,
                output: "ModuleNotFoundError: No module named 'django'".to_string(),
            })
        });
        let check = MissingMigrations::new(&MigrationsConfig::default());

        let failure = check
            .execute(&Workspace::new(&repo, &shell))
            .expect_err("should fail");
        assert!(failure.output().contains("No module named 'django'"));
    }

    #[test]
    fn test_custom_command_and_sentinel() {
        let config = MigrationsConfig {
            command: "./manage makemigrations --check".to_string(),
            sentinel: "nothing to do".to_string(),
            ..MigrationsConfig::default()
        };
        let repo = repo_with_cleanup();
        let mut shell = MockShell::new();
        shell
            .expect_run()
            .withf(|command| command.trim() == "./manage makemigrations --check")
            .returning(|_| Ok(CommandOutput::from_stdout("nothing to do")));

        let check = MissingMigrations::new(&config);
        assert!(check.execute(&Workspace::new(&repo, &shell)).is_ok());
    }

    // =========================================================================
    // MigrationFilenames tests
    // =========================================================================

    fn filenames_check() -> MigrationFilenames {
        MigrationFilenames::new(&MigrationsConfig::default()).expect("default patterns compile")
    }

    fn repo_with_branch_diff(diff: fn() -> Diff) -> crate::core::git::MockRepository {
        let mut repo = repo_with_cleanup();
        repo.expect_diff_against_default()
            .times(1)
            .returning(move || Ok(diff()));
        repo
    }

    #[test]
    fn test_wrongly_named_migration_is_reported() {
        let repo = repo_with_branch_diff(|| {
            added_files(&["app/migrations/0001.py", "app/migrations/add_x.py"])
        });
        let shell = MockShell::new();

        let failure = filenames_check()
            .execute(&Workspace::new(&repo, &shell))
            .expect_err("should fail");
        assert_eq!(failure.message(), "Found wrongly named migration file:");
        assert_eq!(failure.output(), "app/migrations/add_x.py");
    }

    #[test]
    fn test_all_offenders_listed_one_per_line() {
        let repo = repo_with_branch_diff(|| {
            added_files(&[
                "shop/migrations/0001_initial.py",
                "shop/models.py",
                "blog/migrations/new.py",
            ])
        });
        let shell = MockShell::new();

        let failure = filenames_check()
            .execute(&Workspace::new(&repo, &shell))
            .expect_err("should fail");
        assert_eq!(
            failure.output(),
            "shop/migrations/0001_initial.py\nblog/migrations/new.py"
        );
    }

    #[test]
    fn test_modified_migrations_are_ignored() {
        let repo = repo_with_branch_diff(|| modified_files(&["app/migrations/add_x.py"]));
        let shell = MockShell::new();

        assert!(filenames_check()
            .execute(&Workspace::new(&repo, &shell))
            .is_ok());
    }

    #[test]
    fn test_no_new_files_passes() {
        let repo = repo_with_branch_diff(Diff::empty);
        let shell = MockShell::new();

        assert!(filenames_check()
            .execute(&Workspace::new(&repo, &shell))
            .is_ok());
    }

    #[test]
    fn test_resolution_error_becomes_failure() {
        let mut repo = repo_with_cleanup();
        repo.expect_diff_against_default()
            .returning(|| Err(Error::resolution("origin", "remote HEAD is not set")));
        let shell = MockShell::new();

        let failure = filenames_check()
            .execute(&Workspace::new(&repo, &shell))
            .expect_err("should fail");
        assert!(failure.message().contains("origin"));
    }

    #[rstest]
    #[case("app/migrations/0001.py", false)]
    #[case("app/migrations/9999.py", false)]
    #[case("app/migrations/add_x.py", true)]
    #[case("app/migrations/0001_initial.py", true)]
    #[case("app/migrations/__init__.py", true)]
    #[case("app/migrations/sub/0001.py", false)]
    #[case("app/models.py", false)]
    #[case("app/migrations/0001.txt", false)]
    fn test_is_misnamed(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(filenames_check().is_misnamed(path), expected);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let config = MigrationsConfig {
            name_pattern: "(".to_string(),
            ..MigrationsConfig::default()
        };
        let err = MigrationFilenames::new(&config).expect_err("should fail");
        assert!(matches!(err, Error::ConfigInvalid { .. }));
    }
}
