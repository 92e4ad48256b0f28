//! Command-line interface for dev-chamber.
//!
//! This module provides the `devc` CLI with subcommands for:
//! - `qa`: Run quality assurance checks
//! - `init`: Initialize configuration
//! - `validate`: Validate configuration
//! - `config`: Show configuration
//! - `completions`: Generate shell completions

mod commands;

use crate::checks::CheckKind;
use crate::core::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Developer workflow tooling for Django projects.
#[derive(Debug, Parser)]
#[command(
    name = "devc",
    author,
    version,
    about = "Developer workflow tooling for Django projects",
    long_about = r#"
dev-chamber (devc) runs quality assurance checks against the current branch
of a Django project before it is merged.

Every check runs, even after an earlier one failed; the exit code is 0 only
when all of them passed.

Quick start:
  devc init     # Create devchamber.toml
  devc qa all   # Run every configured check

Note: each check stashes uncommitted changes to tracked files when it
finishes. Commit your work first, or recover it with `git stash list`.
"#,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use color output.
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Use this configuration file instead of searching for one.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Always use color.
    Always,
    /// Auto-detect color support.
    #[default]
    Auto,
    /// Never use color.
    Never,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run quality assurance checks.
    Qa {
        /// Which checks to run.
        #[command(subcommand)]
        command: QaCommand,
    },

    /// Write a default devchamber.toml to the current directory.
    #[command(visible_alias = "i")]
    Init {
        /// Overwrite existing configuration.
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration file.
    Validate,

    /// Show configuration file location and contents.
    Config {
        /// Output raw TOML.
        #[arg(long)]
        raw: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Quality assurance subcommands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum QaCommand {
    /// Run every configured check.
    All,
    /// Check that no model change lacks a migration.
    MissingMigrations,
    /// Check the names of migration files added by this branch.
    MigrationFilenames,
    /// Check that message catalogs are up to date.
    MissingTranslations,
    /// Check import order in files changed by this branch.
    ImportOrder,
    /// List registered checks and the tools they need.
    #[command(visible_alias = "ls")]
    List,
}

impl QaCommand {
    /// The single check this subcommand selects, if any.
    #[must_use]
    pub const fn check(self) -> Option<CheckKind> {
        match self {
            Self::MissingMigrations => Some(CheckKind::MissingMigrations),
            Self::MigrationFilenames => Some(CheckKind::MigrationFilenames),
            Self::MissingTranslations => Some(CheckKind::MissingTranslations),
            Self::ImportOrder => Some(CheckKind::ImportOrder),
            Self::All | Self::List => None,
        }
    }
}

/// Runs the CLI.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);
    setup_color(cli.color);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Qa {
            command: QaCommand::List,
        } => commands::qa_list(config),
        Commands::Qa { command } => commands::qa(command.check(), config, cli.quiet),
        Commands::Init { force } => commands::init(force),
        Commands::Validate => commands::validate(config),
        Commands::Config { raw } => commands::config(config, raw),
        Commands::Completions { shell } => {
            commands::completions(shell);
            Ok(ExitCode::SUCCESS)
        },
    }
}

/// Sets up logging based on verbosity flags.
fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Sets up color output.
fn setup_color(choice: ColorChoice) {
    match choice {
        ColorChoice::Always => {
            console::set_colors_enabled(true);
            console::set_colors_enabled_stderr(true);
        },
        ColorChoice::Never => {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        },
        ColorChoice::Auto => {},
    }
}
