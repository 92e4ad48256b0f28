//! Check runner for executing QA checks.
//!
//! This module runs an ordered batch of checks one after another, prints a
//! progress report and aggregates the outcomes into an exit status. A failing
//! check never stops the batch.

use crate::checks::{Check, Workspace};
use crate::core::error::CheckFailure;
use console::style;
use std::fmt::Display;
use std::io::Write;
use std::time::{Duration, Instant};

const RULE: &str = "-----------------------------------------------------------";

/// Outcome of a single check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The check's predicate held.
    Passed,
    /// The check's predicate did not hold.
    Failed(CheckFailure),
}

/// Result of running a single check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    /// Name of the check.
    pub name: String,
    /// What happened.
    pub outcome: Outcome,
    /// Time spent in the check, cleanup included.
    pub duration: Duration,
}

impl CheckResult {
    /// Returns true if the check passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    /// Returns the failure, if the check failed.
    #[must_use]
    pub fn failure(&self) -> Option<&CheckFailure> {
        match &self.outcome {
            Outcome::Passed => None,
            Outcome::Failed(failure) => Some(failure),
        }
    }
}

/// Result of running all checks.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Individual check results, in run order.
    pub checks: Vec<CheckResult>,
    /// Total duration.
    pub duration: Duration,
}

impl RunResult {
    /// Returns true if all checks passed.
    #[must_use]
    pub fn success(&self) -> bool {
        self.checks.iter().all(CheckResult::passed)
    }

    /// Returns the number of passed checks.
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed()).count()
    }

    /// Returns the number of failed checks.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed()).count()
    }

    /// Returns failed check results.
    pub fn failed_checks(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| !c.passed())
    }

    /// Process exit status: 0 when every check passed, 1 otherwise.
    #[must_use]
    pub fn exit_status(&self) -> u8 {
        u8::from(!self.success())
    }
}

/// Runner for executing checks.
#[derive(Debug, Default)]
pub struct Runner {
    checks: Vec<Box<dyn Check>>,
}

impl Runner {
    /// Creates a runner over an ordered batch of checks.
    #[must_use]
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Self { checks }
    }

    /// Number of checks in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Returns true if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Runs every check once, in order, reporting progress to `out`.
    ///
    /// Check failures are recorded in the returned [`RunResult`]. The report
    /// is best-effort: once `out` fails, the remaining checks still run
    /// without output.
    pub fn run(self, ws: &Workspace<'_>, out: &mut dyn Write) -> RunResult {
        let start = Instant::now();
        let total = self.checks.len();
        let mut report = Report::new(out);

        report.title();

        let mut results = Vec::with_capacity(total);
        for (i, check) in self.checks.into_iter().enumerate() {
            let name = check.name().to_string();
            report.line(style(format!("[{}/{total}] {name}...", i + 1)).cyan().bold());

            let check_start = Instant::now();
            let outcome = match check.run(ws) {
                Ok(()) => {
                    report.line(style("OK").green());
                    Outcome::Passed
                },
                Err(failure) => {
                    report.line(style(failure.message()).red());
                    if !failure.output().is_empty() {
                        report.line(failure.output());
                    }
                    Outcome::Failed(failure)
                },
            };
            let duration = check_start.elapsed();
            let passed = outcome == Outcome::Passed;

            tracing::debug!(
                check = %name,
                passed,
                duration = %humantime::format_duration(round_to_millis(duration)),
                "Check finished"
            );

            results.push(CheckResult {
                name,
                outcome,
                duration,
            });
        }

        let result = RunResult {
            checks: results,
            duration: start.elapsed(),
        };

        report.summary(&result);
        report.flush();
        result
    }
}

/// Progress report writer that stops writing after the first I/O error.
struct Report<'a> {
    out: &'a mut dyn Write,
    broken: bool,
}

impl<'a> Report<'a> {
    fn new(out: &'a mut dyn Write) -> Self {
        Self { out, broken: false }
    }

    fn line(&mut self, line: impl Display) {
        if self.broken {
            return;
        }
        if let Err(e) = writeln!(self.out, "{line}") {
            self.fail(&e);
        }
    }

    fn flush(&mut self) {
        if self.broken {
            return;
        }
        if let Err(e) = self.out.flush() {
            self.fail(&e);
        }
    }

    fn fail(&mut self, e: &std::io::Error) {
        tracing::warn!(error = %e, "Cannot write check report; remaining checks run silently");
        self.broken = true;
    }

    fn title(&mut self) {
        self.line(RULE);
        self.line(style(" Quality Assurance Check").bold());
        self.line(RULE);
    }

    fn summary(&mut self, result: &RunResult) {
        self.line(RULE);

        let elapsed = style(format!(
            "({})",
            humantime::format_duration(round_to_millis(result.duration))
        ))
        .dim();
        if result.success() {
            self.line(format_args!(
                "{} {elapsed}",
                style("SUCCESS: All QA checks passed!").green().bold()
            ));
        } else {
            self.line(format_args!(
                "{} {elapsed}",
                style(format!("FAILURE: {} check(s) failed!", result.failed_count()))
                    .red()
                    .bold()
            ));
        }

        self.line(RULE);
    }
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
