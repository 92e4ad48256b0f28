//! Command execution for QA checks.
//!
//! This module runs external tools (migration generators, catalog builders,
//! import sorters) synchronously and captures their output. A non-zero exit
//! is turned into [`Error::Command`] carrying the combined output.

use crate::core::error::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Duration the command took to run.
    pub duration: Duration,
}

impl CommandOutput {
    /// Creates a successful output with the given stdout.
    #[must_use]
    pub fn from_stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Returns true if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns combined stdout and stderr output.
    #[must_use]
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Runs external commands on behalf of checks.
#[cfg_attr(test, mockall::automock)]
pub trait Shell {
    /// Runs `command` to completion.
    ///
    /// Fails with [`Error::Command`] when the command exits non-zero.
    fn run(&self, command: &str) -> Result<CommandOutput>;
}

/// Executor for running shell commands.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    cwd: Option<PathBuf>,
    show_progress: bool,
}

impl Executor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cwd: None,
            show_progress: false,
        }
    }

    /// Sets the working directory.
    #[must_use]
    pub fn cwd(mut self, path: impl AsRef<Path>) -> Self {
        self.cwd = Some(path.as_ref().to_path_buf());
        self
    }

    /// Shows a spinner on stderr while a command runs.
    #[must_use]
    pub const fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Executes a shell command and returns its output, whatever the exit code.
    pub fn execute(&self, command: &str) -> Result<CommandOutput> {
        let start = Instant::now();

        let (shell, shell_arg) = if cfg!(windows) {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(shell_arg).arg(command);

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd.stdin(Stdio::null());

        tracing::debug!(command = %command, "Running command");

        let spinner = self.show_progress.then(|| spinner(command));
        let result = cmd.output();
        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let output = result.map_err(|e| Error::io(format!("run command '{command}'"), e))?;

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        })
    }

    /// Checks if a command exists in PATH.
    #[must_use]
    pub fn command_exists(command: &str) -> bool {
        which::which(command).is_ok()
    }

    /// Checks if the program a command line starts with exists in PATH.
    #[must_use]
    pub fn program_exists(command_line: &str) -> bool {
        command_line
            .split_whitespace()
            .next()
            .is_some_and(Self::command_exists)
    }
}

impl Shell for Executor {
    fn run(&self, command: &str) -> Result<CommandOutput> {
        let output = self.execute(command)?;

        if !output.success() {
            tracing::debug!(
                command = %command,
                exit_code = output.exit_code,
                "Command failed"
            );
            return Err(Error::Command {
                command: command.to_string(),
                exit_code: output.exit_code,
                output: output.combined_output(),
            });
        }

        Ok(output)
    }
}

/// Quotes a single argument for `sh` if it contains special characters.
#[must_use]
pub fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ',' | ':' | '@' | '+' | '='));

    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn spinner(command: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .ok()
            .unwrap_or_else(ProgressStyle::default_spinner),
    );
    pb.set_message(format!("Running {command}..."));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_execute_simple_command() {
        let output = Executor::new()
            .execute("echo hello")
            .expect("should succeed");

        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[test]
    fn test_execute_failing_command_is_not_an_error() {
        let output = Executor::new().execute("exit 3").expect("should complete");
        assert!(!output.success());
        assert_eq!(output.exit_code, 3);
    }

    #[test]
    fn test_run_returns_output_on_success() {
        let output = Executor::new()
            .run("printf 'a\\nNo changes detected\\n'")
            .expect("should succeed");
        assert_eq!(output.stdout, "a\nNo changes detected\n");
    }

    #[test]
    fn test_run_failure_carries_combined_output() {
        let err = Executor::new()
            .run("echo to-stdout; echo to-stderr >&2; exit 2")
            .expect_err("should fail");

        assert!(matches!(&err, Error::Command { command, exit_code, output }
            if command == "echo to-stdout; echo to-stderr >&2; exit 2"
                && *exit_code == 2
                && output.contains("to-stdout")
                && output.contains("to-stderr")
        ));
    }

    #[test]
    fn test_execute_in_cwd() {
        let temp = tempfile::TempDir::new().expect("create temp dir");
        std::fs::write(temp.path().join("marker.txt"), "x").expect("write file");

        let output = Executor::new()
            .cwd(temp.path())
            .run("ls")
            .expect("should succeed");
        assert!(output.stdout.contains("marker.txt"));
    }

    #[test]
    fn test_combined_output() {
        let output = CommandOutput {
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            ..CommandOutput::default()
        };
        assert_eq!(output.combined_output(), "out\nerr");
        assert_eq!(CommandOutput::from_stdout("only").combined_output(), "only");
    }

    #[test]
    fn test_command_exists() {
        if cfg!(unix) {
            assert!(Executor::command_exists("sh"));
            assert!(Executor::program_exists("sh -c true"));
        }
        assert!(!Executor::command_exists("definitely_not_a_real_command_12345"));
        assert!(!Executor::program_exists(""));
    }

    #[rstest]
    #[case("app/models.py", "app/models.py")]
    #[case("dir with space/a.py", "'dir with space/a.py'")]
    #[case("it's.py", r"'it'\''s.py'")]
    #[case("", "''")]
    fn test_quote(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(quote(input), expected);
    }

    #[test]
    fn test_quoted_argument_round_trips_through_sh() {
        let output = Executor::new()
            .run(&format!("printf '%s' {}", quote("it's a file.py")))
            .expect("should succeed");
        assert_eq!(output.stdout, "it's a file.py");
    }
}
