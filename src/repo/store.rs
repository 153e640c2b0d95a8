//! Durable "active / recent repository" state.
//!
//! Every mutation is a whole-document read-modify-write. There is no file lock:
//! two processes writing at nearly the same time can drop one update
//! (last write wins). Callers only see the [`StateStore`] trait, so a locking or
//! rename-based backend can replace [`JsonFileStore`] without touching them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use repogate_common::constants::STATE_FILE_NAME;
use repogate_common::{HealthyReport, PersistedRepoRecord, RepositoryState};
use tracing::{debug, info, warn};

use crate::errors::StoreError;

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Current state; absent or corrupt storage reads as empty.
    async fn read(&self) -> RepositoryState;

    /// Replace the stored document.
    async fn write(&self, state: &RepositoryState) -> Result<(), StoreError>;

    /// Make a healthy repo active and move it to the front of `recent`.
    async fn persist_active(&self, report: &HealthyReport) -> Result<RepositoryState, StoreError> {
        let mut state = self.read().await;
        state.activate(PersistedRepoRecord::from_healthy(report, Utc::now()));
        self.write(&state).await?;
        info!(repo = %report.repo_path.display(), "active repository persisted");
        Ok(state)
    }

    /// Clear `active`; also drop `failed` from `recent` when given.
    async fn clear_active(&self, failed: Option<&Path>) -> Result<RepositoryState, StoreError> {
        let mut state = self.read().await;
        state.deactivate(failed);
        self.write(&state).await?;
        info!(failed = ?failed, "active repository cleared");
        Ok(state)
    }

    /// Forget a canonical repo path entirely.
    async fn remove_repo(&self, repo_path: &Path) -> Result<RepositoryState, StoreError> {
        let mut state = self.read().await;
        state.forget(repo_path);
        self.write(&state).await?;
        info!(repo = %repo_path.display(), "repository removed");
        Ok(state)
    }
}

/// Pretty-printed JSON at `{app_data_root}/repository-state.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(app_data_root: impl Into<PathBuf>) -> Self {
        let root = app_data_root.into();
        let path = root.join(STATE_FILE_NAME);
        Self { root, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn ensure_root(&self) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|source| StoreError::CreateDir {
                path: self.root.clone(),
                source,
            })
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn read(&self) -> RepositoryState {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet");
                return RepositoryState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file unreadable, using empty state");
                return RepositoryState::default();
            }
        };

        match serde_json::from_str::<RepositoryState>(&raw) {
            Ok(state) => state,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "state file corrupt, using empty state");
                RepositoryState::default()
            }
        }
    }

    async fn write(&self, state: &RepositoryState) -> Result<(), StoreError> {
        self.ensure_root().await?;
        let json = serde_json::to_string_pretty(state)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
