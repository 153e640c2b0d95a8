//! JSON output and exit-code helpers shared by the commands.

use std::process::ExitCode;

use anyhow::Result;
use repogate::errors::{RepoPathError, ServiceError};
use repogate_common::HealthVerdict;
use serde::Serialize;

/// Unhealthy verdict or nothing to restore.
pub const EXIT_UNHEALTHY: u8 = 2;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn verdict_exit(verdict: &HealthVerdict) -> ExitCode {
    if verdict.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_UNHEALTHY)
    }
}

/// `{error, code}` on stdout, a styled line on stderr, exit 1.
pub fn path_error(err: &RepoPathError) -> Result<ExitCode> {
    print_json(&serde_json::json!({"error": err.to_string(), "code": err.code()}))?;
    eprintln!("{} {}", console::style("Error:").red().bold(), err);
    Ok(ExitCode::FAILURE)
}

/// Path rejections are reported as data; storage failures propagate.
pub fn service_error(op: &str, err: ServiceError) -> Result<ExitCode> {
    match err {
        ServiceError::Path(e) => path_error(&e),
        ServiceError::Store(e) => Err(anyhow::Error::new(e).context(format!("Unable to {op} repository"))),
    }
}
