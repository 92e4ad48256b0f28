//! Error types for dev-chamber.
//!
//! [`Error`] covers everything that can go wrong while loading configuration,
//! talking to git or running external tools. [`CheckFailure`] is the outcome
//! of a QA check whose predicate did not hold; it is what the runner reports.

use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in dev-chamber.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Configuration errors
    // =========================================================================
    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path where config was expected.
        path: PathBuf,
    },

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        /// Description of the parse error.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {field} - {message}")]
    ConfigInvalid {
        /// Field name that is invalid.
        field: String,
        /// Description of why it's invalid.
        message: String,
    },

    // =========================================================================
    // Git errors
    // =========================================================================
    /// Not in a Git repository.
    #[error("Not in a Git repository")]
    NotGitRepo,

    /// The remote's default branch could not be resolved.
    #[error("Cannot resolve default branch of remote '{remote}': {message}")]
    Resolution {
        /// Remote whose HEAD reference was read.
        remote: String,
        /// Error message.
        message: String,
    },

    /// Git operation failed (branch lookup, merge-base, diff, stash).
    #[error("Git operation failed: {operation} - {message}")]
    Vcs {
        /// Name of the operation that failed.
        operation: String,
        /// Error message.
        message: String,
    },

    // =========================================================================
    // External command errors
    // =========================================================================
    /// External command exited with a non-zero status.
    #[error("Command '{command}' failed with exit code {exit_code}")]
    Command {
        /// The command line that was run.
        command: String,
        /// Exit code of the process.
        exit_code: i32,
        /// Combined stdout and stderr of the process.
        output: String,
    },

    // =========================================================================
    // I/O errors
    // =========================================================================
    /// File I/O error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of what failed.
        message: String,
        /// Source error.
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Internal errors
    // =========================================================================
    /// Internal error (should never happen).
    #[error("Internal error: {message}")]
    Internal {
        /// Error message.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration parse error with source.
    pub fn config_parse_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new invalid configuration error.
    pub fn config_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a new I/O error with context.
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Creates a new Git operation error.
    pub fn git(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Vcs {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Creates a new default branch resolution error.
    pub fn resolution(remote: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            remote: remote.into(),
            message: message.into(),
        }
    }

    /// Returns true if this is a user-correctable error.
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. }
                | Self::ConfigInvalid { .. }
                | Self::NotGitRepo
                | Self::Resolution { .. }
        )
    }

    /// Returns an exit code appropriate for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigNotFound { .. } | Self::ConfigParse { .. } | Self::ConfigInvalid { .. } => {
                78
            }, // EX_CONFIG
            Self::NotGitRepo | Self::Resolution { .. } | Self::Vcs { .. } => 65, // EX_DATAERR
            _ => 1,
        }
    }
}

/// A QA check whose predicate did not hold.
///
/// Carries a short message and the raw diagnostic text (tool output or a list
/// of offending files). The output is stored trimmed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct CheckFailure {
    message: String,
    output: String,
}

impl CheckFailure {
    /// Creates a new check failure.
    pub fn new(message: impl Into<String>, output: impl AsRef<str>) -> Self {
        Self {
            message: message.into(),
            output: output.as_ref().trim().to_string(),
        }
    }

    /// Short human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Captured diagnostic output.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }
}

impl From<Error> for CheckFailure {
    fn from(err: Error) -> Self {
        let message = err.to_string();
        match err {
            Error::Command { output, .. } => Self::new(message, output),
            _ => Self::new(message, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Display / Error message tests
    // =========================================================================

    #[test]
    fn test_display_config_not_found() {
        let err = Error::ConfigNotFound {
            path: PathBuf::from("/my/devchamber.toml"),
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /my/devchamber.toml"
        );
    }

    fn parse_error(message: &str) -> Error {
        let toml_err = toml::from_str::<toml::Value>("bad").expect_err("should fail");
        Error::config_parse_with_source(message, toml_err)
    }

    #[test]
    fn test_display_config_parse() {
        let err = parse_error("bad toml syntax");
        assert_eq!(
            err.to_string(),
            "Failed to parse configuration: bad toml syntax"
        );
    }

    #[test]
    fn test_display_config_invalid() {
        let err = Error::config_invalid("git.remote", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: git.remote - must not be empty"
        );
    }

    #[test]
    fn test_display_resolution() {
        let err = Error::resolution("origin", "no HEAD reference");
        assert_eq!(
            err.to_string(),
            "Cannot resolve default branch of remote 'origin': no HEAD reference"
        );
    }

    #[test]
    fn test_display_vcs() {
        let err = Error::git("merge-base", "no common ancestor");
        assert_eq!(
            err.to_string(),
            "Git operation failed: merge-base - no common ancestor"
        );
    }

    #[test]
    fn test_display_command() {
        let err = Error::Command {
            command: "isort a.py".to_string(),
            exit_code: 2,
            output: "boom".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Command 'isort a.py' failed with exit code 2"
        );
    }

    #[test]
    fn test_display_io() {
        let err = Error::io("read config", std::io::Error::other("file not found"));
        assert_eq!(err.to_string(), "I/O error: read config");
    }

    // =========================================================================
    // Exit code / classification tests
    // =========================================================================

    #[test]
    fn test_exit_codes() {
        assert_eq!(parse_error("x").exit_code(), 78);
        assert_eq!(Error::config_invalid("x", "y").exit_code(), 78);
        assert_eq!(Error::NotGitRepo.exit_code(), 65);
        assert_eq!(Error::resolution("origin", "x").exit_code(), 65);
        assert_eq!(Error::git("op", "msg").exit_code(), 65);
        assert_eq!(
            Error::Internal {
                message: "x".into()
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_is_user_error() {
        assert!(Error::NotGitRepo.is_user_error());
        assert!(Error::resolution("origin", "x").is_user_error());
        assert!(Error::config_invalid("x", "y").is_user_error());
        assert!(!Error::git("op", "msg").is_user_error());
        assert!(!parse_error("x").is_user_error());
    }

    #[test]
    fn test_config_parse_with_source_has_source() {
        use std::error::Error as StdError;
        let toml_err = toml::from_str::<toml::Value>("bad").expect_err("should fail");
        let err = Error::config_parse_with_source("msg", toml_err);
        assert!(err.source().is_some());
    }

    // =========================================================================
    // CheckFailure tests
    // =========================================================================

    #[test]
    fn test_check_failure_trims_output() {
        let failure = CheckFailure::new("Found missing migration(s)!", "\n  output\n\n");
        assert_eq!(failure.message(), "Found missing migration(s)!");
        assert_eq!(failure.output(), "output");
        assert_eq!(failure.to_string(), "Found missing migration(s)!");
    }

    #[test]
    fn test_command_error_output_is_kept_verbatim() {
        let err = Error::Command {
            command: "isort a.py".to_string(),
            exit_code: 1,
            output: "ERROR: a.py Imports are incorrectly sorted".to_string(),
        };
        let failure = CheckFailure::from(err);
        assert_eq!(failure.message(), "Command 'isort a.py' failed with exit code 1");
        assert_eq!(failure.output(), "ERROR: a.py Imports are incorrectly sorted");
    }

    #[test]
    fn test_vcs_error_becomes_failure_without_output() {
        let failure = CheckFailure::from(Error::git("merge-base", "unrelated histories"));
        assert_eq!(
            failure.message(),
            "Git operation failed: merge-base - unrelated histories"
        );
        assert!(failure.output().is_empty());
    }
}
