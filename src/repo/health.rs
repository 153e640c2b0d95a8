//! Health evaluation: guard + locate + interpret, folded into one verdict.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use repogate_common::constants::REQUIRED_CONFIG_ARTIFACT;
use repogate_common::{HealthVerdict, HealthyReport, UnhealthyReport};
use tracing::{debug, warn};

use super::guard::PathGuard;
use super::interpreter::{extract_output_folder, resolve_output_folder};
use super::locator::ConfigLocator;
use crate::errors::RepoPathError;
use crate::util::relative_display;

pub struct HealthEvaluator {
    guard: Arc<PathGuard>,
    locator: ConfigLocator,
}

impl HealthEvaluator {
    pub fn new(guard: Arc<PathGuard>) -> Self {
        Self {
            guard,
            locator: ConfigLocator::default(),
        }
    }

    pub fn with_locator(mut self, locator: ConfigLocator) -> Self {
        self.locator = locator;
        self
    }

    /// Evaluate `raw_path`.
    ///
    /// Only path guard rejections are errors; every other outcome, including
    /// an unreadable config, is an unhealthy verdict.
    pub async fn evaluate(
        &self,
        raw_path: &str,
        display_name: Option<String>,
    ) -> Result<HealthVerdict, RepoPathError> {
        let resolved = self.guard.authorize(raw_path).await?;
        let repo_path = self
            .guard
            .authorize(&resolved.to_string_lossy())
            .await?;

        let validated_at = Utc::now();
        let unhealthy = |missing: Vec<String>,
                         config_path: Option<PathBuf>,
                         output_folder: Option<PathBuf>| {
            HealthVerdict::Unhealthy(UnhealthyReport {
                repo_path: repo_path.clone(),
                missing,
                validated_at,
                display_name: display_name.clone(),
                config_path,
                output_folder,
            })
        };
        let required = || vec![REQUIRED_CONFIG_ARTIFACT.to_string()];

        if !is_dir(&repo_path).await {
            debug!(repo = %repo_path.display(), "repo path is not a directory");
            return Ok(unhealthy(required(), None, None));
        }

        let Some(config_path) = self.locator.find(&repo_path).await else {
            return Ok(unhealthy(required(), None, None));
        };

        let mut artifacts = vec![relative_display(&repo_path, &config_path)];
        let mut missing = Vec::new();

        let config_text = match tokio::fs::read_to_string(&config_path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(config = %config_path.display(), error = %e, "config unreadable");
                return Ok(unhealthy(required(), Some(config_path), None));
            }
        };

        let mut output_folder = None;
        if let Some(declared) = extract_output_folder(&config_text).filter(|v| !v.is_empty()) {
            let resolved_output = resolve_output_folder(&declared, &repo_path);
            let relative = relative_display(&repo_path, &resolved_output);
            if is_readable_dir(&resolved_output).await {
                artifacts.push(relative);
            } else {
                debug!(output = %resolved_output.display(), "output folder missing or unreadable");
                missing.push(relative);
            }
            output_folder = Some(resolved_output);
        }

        if !missing.is_empty() {
            return Ok(unhealthy(missing, Some(config_path), output_folder));
        }

        Ok(HealthVerdict::Healthy(HealthyReport {
            repo_path: repo_path.clone(),
            artifacts,
            validated_at,
            display_name,
            config_path,
            output_folder,
        }))
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Exists, is a directory, and can be listed.
async fn is_readable_dir(path: &Path) -> bool {
    is_dir(path).await && tokio::fs::read_dir(path).await.is_ok()
}
