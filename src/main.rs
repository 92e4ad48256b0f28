//! Main entry point for the `devc` CLI.

use console::style;
use dev_chamber::cli;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            if !e.is_user_error() {
                if let Some(source) = std::error::Error::source(&e) {
                    eprintln!("  Caused by: {source}");
                }
            }
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        },
    }
}
