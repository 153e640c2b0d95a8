//! Façade shared by every transport adapter.

use std::path::PathBuf;
use std::sync::Arc;

use repogate_common::{HealthVerdict, RepositoryEntry, RepositoryState};
use serde::Serialize;
use tracing::info;

use super::docs::{self, DocContent};
use super::guard::{AllowedRoots, PathGuard};
use super::health::HealthEvaluator;
use super::store::{JsonFileStore, StateStore};
use crate::errors::{DocError, ServiceError};

/// Verdict plus the state that resulted from reconciling it.
#[derive(Debug, Clone, Serialize)]
pub struct PersistOutcome {
    #[serde(flatten)]
    pub verdict: HealthVerdict,
    pub state: RepositoryState,
}

/// Returned by `restore` when no path was given and nothing is active.
#[derive(Debug, Clone, Serialize)]
pub struct NothingToRestore {
    pub status: &'static str,
    pub message: &'static str,
    pub state: RepositoryState,
}

impl NothingToRestore {
    fn new(state: RepositoryState) -> Self {
        Self {
            status: "unhealthy",
            message: "No repo to restore",
            state,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RestoreOutcome {
    Reconciled(PersistOutcome),
    NothingToRestore(NothingToRestore),
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveOutcome {
    pub state: RepositoryState,
}

/// validate / persist / restore / remove over one guard, evaluator and store.
pub struct RepositoryService {
    guard: Arc<PathGuard>,
    evaluator: HealthEvaluator,
    store: Arc<dyn StateStore>,
}

impl RepositoryService {
    pub fn new(roots: AllowedRoots, store: Arc<dyn StateStore>) -> Self {
        let guard = Arc::new(PathGuard::new(roots));
        let evaluator = HealthEvaluator::new(guard.clone());
        Self {
            guard,
            evaluator,
            store,
        }
    }

    /// Service backed by the JSON state file under `app_data_root`.
    pub fn with_app_data(roots: AllowedRoots, app_data_root: impl Into<PathBuf>) -> Self {
        Self::new(roots, Arc::new(JsonFileStore::new(app_data_root)))
    }

    /// Evaluate only; never touches stored state.
    pub async fn validate(
        &self,
        repo_path: &str,
        display_name: Option<String>,
    ) -> Result<HealthVerdict, ServiceError> {
        Ok(self.evaluator.evaluate(repo_path, display_name).await?)
    }

    /// Evaluate, then make the repo active if healthy or drop it if not.
    pub async fn persist(
        &self,
        repo_path: &str,
        display_name: Option<String>,
    ) -> Result<PersistOutcome, ServiceError> {
        let verdict = self.evaluator.evaluate(repo_path, display_name).await?;
        self.reconcile(verdict).await
    }

    /// Re-validate `repo_path`, or the stored active repo when none is given.
    pub async fn restore(&self, repo_path: Option<&str>) -> Result<RestoreOutcome, ServiceError> {
        let state = self.store.read().await;
        let requested = repo_path.filter(|p| !p.trim().is_empty());

        let active_path = state
            .active
            .as_ref()
            .map(|active| active.repo_path.to_string_lossy().to_string());
        let Some(target) = requested.map(str::to_string).or(active_path) else {
            return Ok(RestoreOutcome::NothingToRestore(NothingToRestore::new(state)));
        };

        let verdict = self.evaluator.evaluate(&target, None).await?;
        info!(repo = %verdict.repo_path().display(), status = verdict.status(), "restore re-validated");
        Ok(RestoreOutcome::Reconciled(self.reconcile(verdict).await?))
    }

    /// Forget a repo. The path must pass the guard even though nothing is evaluated.
    pub async fn remove(&self, repo_path: &str) -> Result<RemoveOutcome, ServiceError> {
        let canonical = self.guard.authorize(repo_path).await?;
        let state = self.store.remove_repo(&canonical).await?;
        Ok(RemoveOutcome { state })
    }

    pub async fn state(&self) -> RepositoryState {
        self.store.read().await
    }

    /// Active repo first, then recent repos not already listed.
    pub async fn repository_list(&self) -> Vec<RepositoryEntry> {
        self.store.read().await.repository_list()
    }

    pub async fn read_doc(&self, repo_path: &str, relative: &str) -> Result<DocContent, DocError> {
        docs::read_doc(&self.guard, repo_path, relative).await
    }

    pub async fn read_status(&self, repo_path: &str) -> Result<DocContent, DocError> {
        docs::read_status(&self.guard, repo_path).await
    }

    pub fn allowed_roots(&self) -> Vec<PathBuf> {
        self.guard.allowed_roots()
    }

    /// Swap in a freshly computed root set.
    pub fn refresh_roots(&self, roots: AllowedRoots) {
        info!(count = roots.roots().len(), "allowed roots refreshed");
        self.guard.replace(roots);
    }

    async fn reconcile(&self, verdict: HealthVerdict) -> Result<PersistOutcome, ServiceError> {
        let state = match &verdict {
            HealthVerdict::Healthy(report) => self.store.persist_active(report).await?,
            HealthVerdict::Unhealthy(report) => {
                self.store.clear_active(Some(report.repo_path.as_path())).await?
            }
        };
        Ok(PersistOutcome { verdict, state })
    }
}
