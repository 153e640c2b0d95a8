//! Read-only access to documents under a repo's `devDocs` folder.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use repogate_common::constants::{DOCS_PREFIX, WORKFLOW_STATUS_DOC};
use serde::Serialize;

use super::guard::PathGuard;
use crate::errors::{DocError, RepoPathError};
use crate::util::{is_path_inside, normalize_lexically};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocContent {
    pub content: String,
    pub updated_at: DateTime<Utc>,
    pub path: PathBuf,
}

pub async fn read_doc(
    guard: &PathGuard,
    repo_path: &str,
    relative: &str,
) -> Result<DocContent, DocError> {
    let repo = guard.authorize(repo_path).await?;

    if relative.is_empty() || relative.contains("..") {
        return Err(RepoPathError::Invalid("Invalid doc path".into()).into());
    }
    if !relative.starts_with(DOCS_PREFIX) {
        return Err(RepoPathError::Forbidden(format!("Doc path must be under {DOCS_PREFIX}")).into());
    }

    let target = normalize_lexically(&repo.join(relative));
    if !is_path_inside(&repo, &target) {
        return Err(RepoPathError::Forbidden("Path outside repo scope".into()).into());
    }

    let read_err = |path: &PathBuf| {
        let path = path.clone();
        move |source: std::io::Error| DocError::Read { path, source }
    };
    let target = tokio::fs::canonicalize(&target)
        .await
        .map_err(read_err(&target))?;
    if !is_path_inside(&repo, &target) {
        return Err(RepoPathError::Forbidden("Path outside repo scope".into()).into());
    }

    let content = tokio::fs::read_to_string(&target)
        .await
        .map_err(read_err(&target))?;
    let modified = tokio::fs::metadata(&target)
        .await
        .and_then(|m| m.modified())
        .map_err(read_err(&target))?;

    Ok(DocContent {
        content,
        updated_at: DateTime::<Utc>::from(modified),
        path: target,
    })
}

/// The workflow status document of `repo_path`.
pub async fn read_status(guard: &PathGuard, repo_path: &str) -> Result<DocContent, DocError> {
    read_doc(guard, repo_path, WORKFLOW_STATUS_DOC).await
}
