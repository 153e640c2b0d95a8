//! Repository lifecycle commands: `repogate validate|persist|restore|remove|list|roots`.

use std::process::ExitCode;

use anyhow::Result;
use repogate::RepositoryService;
use repogate::repo::RestoreOutcome;

use super::output::{EXIT_UNHEALTHY, print_json, service_error, verdict_exit};

pub async fn cmd_validate(
    service: &RepositoryService,
    path: &str,
    name: Option<String>,
) -> Result<ExitCode> {
    match service.validate(path, name).await {
        Ok(verdict) => {
            print_json(&verdict)?;
            Ok(verdict_exit(&verdict))
        }
        Err(e) => service_error("validate", e),
    }
}

pub async fn cmd_persist(
    service: &RepositoryService,
    path: &str,
    name: Option<String>,
) -> Result<ExitCode> {
    match service.persist(path, name).await {
        Ok(outcome) => {
            print_json(&outcome)?;
            Ok(verdict_exit(&outcome.verdict))
        }
        Err(e) => service_error("persist", e),
    }
}

pub async fn cmd_restore(service: &RepositoryService, path: Option<&str>) -> Result<ExitCode> {
    match service.restore(path).await {
        Ok(outcome) => {
            print_json(&outcome)?;
            Ok(match &outcome {
                RestoreOutcome::Reconciled(o) => verdict_exit(&o.verdict),
                RestoreOutcome::NothingToRestore(_) => ExitCode::from(EXIT_UNHEALTHY),
            })
        }
        Err(e) => service_error("restore", e),
    }
}

pub async fn cmd_remove(service: &RepositoryService, path: &str) -> Result<ExitCode> {
    match service.remove(path).await {
        Ok(outcome) => {
            print_json(&outcome)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => service_error("remove", e),
    }
}

pub async fn cmd_list(service: &RepositoryService) -> Result<ExitCode> {
    print_json(&service.repository_list().await)?;
    Ok(ExitCode::SUCCESS)
}

pub fn cmd_roots(service: &RepositoryService) -> Result<ExitCode> {
    print_json(&serde_json::json!({"roots": service.allowed_roots()}))?;
    Ok(ExitCode::SUCCESS)
}
