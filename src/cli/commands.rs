//! CLI command implementations.

use crate::checks::{builtin, CheckKind, Workspace};
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::core::error::{Error, Result};
use crate::core::executor::Executor;
use crate::core::git::GitRepo;
use crate::core::runner::Runner;
use console::style;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Loads the configuration named on the command line, or searches for one.
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load_or_default(),
    }
}

/// Run QA checks: a single one, or the configured batch.
pub fn qa(selection: Option<CheckKind>, config_path: Option<&Path>, quiet: bool) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let repo = GitRepo::discover(config.git_settings())?;

    if repo.has_uncommitted_changes()? {
        tracing::warn!(
            "Uncommitted changes to tracked files will be stashed by the first check; \
             find them with `git stash list`"
        );
    }

    let kinds = selection.map_or_else(|| config.qa.checks.clone(), |kind| vec![kind]);
    let runner = Runner::new(builtin::build_all(&kinds, &config.qa)?);

    let executor = Executor::new().cwd(repo.root()).show_progress(!quiet);
    let ws = Workspace::new(&repo, &executor);

    tracing::debug!(
        root = %repo.root().display(),
        checks = runner.len(),
        "Running QA checks"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = runner.run(&ws, &mut out);

    Ok(ExitCode::from(result.exit_status()))
}

/// List registered checks with the external tool each one needs.
pub fn qa_list(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;

    eprintln!("{}", style("Registered checks:").bold());
    for kind in CheckKind::ALL {
        let marker = if config.qa.checks.contains(&kind) {
            style("•").cyan()
        } else {
            style("-").dim()
        };
        eprintln!("  {marker} {} - {}", style(kind.slug()).cyan(), kind.title());

        match kind.tool(&config.qa) {
            Some(command) if Executor::program_exists(command) => {
                eprintln!("      {} {command}", style("✓").green());
            },
            Some(command) => {
                eprintln!("      {} {command} (not found in PATH)", style("!").yellow());
            },
            None => eprintln!("      git only"),
        }
    }

    let disabled: Vec<_> = CheckKind::ALL
        .iter()
        .filter(|kind| !config.qa.checks.contains(*kind))
        .map(CheckKind::slug)
        .collect();
    if !disabled.is_empty() {
        eprintln!();
        eprintln!("Not run by `devc qa all`: {}", disabled.join(", "));
    }

    Ok(ExitCode::SUCCESS)
}

/// Initialize configuration.
pub fn init(force: bool) -> Result<ExitCode> {
    let config_path = PathBuf::from(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration already exists: {}",
            style("!").yellow(),
            config_path.display()
        );
        eprintln!("  Use --force to overwrite.");
        return Ok(ExitCode::FAILURE);
    }

    let toml = Config::default_toml()?;
    std::fs::write(&config_path, toml).map_err(|e| Error::io("write config", e))?;

    eprintln!("{} Created {}", style("✓").green(), config_path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Review the tool commands in {CONFIG_FILE_NAME}");
    eprintln!("  2. Run: devc qa all");

    Ok(ExitCode::SUCCESS)
}

/// Validate configuration.
pub fn validate(config_path: Option<&Path>) -> Result<ExitCode> {
    let loaded = match config_path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    match loaded {
        Ok(_) => {
            eprintln!("{} Configuration is valid", style("✓").green());
            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { path }) => {
            eprintln!(
                "{} Configuration not found: {}",
                style("!").yellow(),
                path.display()
            );
            eprintln!("  Run: devc init");
            Ok(ExitCode::FAILURE)
        },
        Err(e) => {
            eprintln!("{} Configuration validation failed: {e}", style("✗").red());
            Ok(ExitCode::FAILURE)
        },
    }
}

/// Show configuration.
pub fn config(config_path: Option<&Path>, raw: bool) -> Result<ExitCode> {
    let found = match config_path {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        None => Config::find_config_file(),
    };

    match found {
        Ok(path) => {
            eprintln!("Configuration file: {}", path.display());

            if raw {
                let content =
                    std::fs::read_to_string(&path).map_err(|e| Error::io("read config", e))?;
                eprintln!();
                std::io::stdout()
                    .write_all(content.as_bytes())
                    .map_err(|e| Error::io("write output", e))?;
            }

            Ok(ExitCode::SUCCESS)
        },
        Err(Error::ConfigNotFound { .. }) => {
            eprintln!("{} No configuration file found, using defaults", style("!").yellow());
            eprintln!("  Run: devc init");

            if raw {
                std::io::stdout()
                    .write_all(Config::default_toml()?.as_bytes())
                    .map_err(|e| Error::io("write output", e))?;
            }

            Ok(ExitCode::FAILURE)
        },
        Err(e) => Err(e),
    }
}

/// Generate shell completions.
pub fn completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(
        shell,
        &mut super::Cli::command(),
        "devc",
        &mut std::io::stdout(),
    );
}
