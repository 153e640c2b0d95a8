//! Scoped document reads: `repogate doc|status`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use repogate::RepositoryService;
use repogate::errors::DocError;
use repogate::repo::docs::DocContent;

use super::output::{path_error, print_json};

pub async fn cmd_doc(service: &RepositoryService, repo: &str, relative: &str) -> Result<ExitCode> {
    report(service.read_doc(repo, relative).await)
}

pub async fn cmd_status(service: &RepositoryService, repo: &str) -> Result<ExitCode> {
    report(service.read_status(repo).await)
}

fn report(result: Result<DocContent, DocError>) -> Result<ExitCode> {
    match result {
        Ok(doc) => {
            print_json(&doc)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(DocError::Path(e)) => path_error(&e),
        Err(e) => Err(e).context("Unable to read document"),
    }
}
