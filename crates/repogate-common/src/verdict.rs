use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Outcome of evaluating a repository root.
///
/// Serialises with a `status` tag of `"healthy"` or `"unhealthy"`. A fresh
/// verdict is produced by every evaluation; verdicts are never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum HealthVerdict {
    Healthy(HealthyReport),
    Unhealthy(UnhealthyReport),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthyReport {
    pub repo_path: PathBuf,
    /// Repo-relative paths of the artifacts that were found, config first.
    pub artifacts: Vec<String>,
    pub validated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub config_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnhealthyReport {
    pub repo_path: PathBuf,
    /// Repo-relative paths or logical artifact names that are absent.
    pub missing: Vec<String>,
    pub validated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,
}

impl HealthVerdict {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthVerdict::Healthy(_))
    }

    /// The `status` tag as it appears on the wire.
    pub fn status(&self) -> &'static str {
        match self {
            HealthVerdict::Healthy(_) => "healthy",
            HealthVerdict::Unhealthy(_) => "unhealthy",
        }
    }

    pub fn repo_path(&self) -> &Path {
        match self {
            HealthVerdict::Healthy(r) => &r.repo_path,
            HealthVerdict::Unhealthy(r) => &r.repo_path,
        }
    }

    pub fn validated_at(&self) -> DateTime<Utc> {
        match self {
            HealthVerdict::Healthy(r) => r.validated_at,
            HealthVerdict::Unhealthy(r) => r.validated_at,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            HealthVerdict::Healthy(r) => r.display_name.as_deref(),
            HealthVerdict::Unhealthy(r) => r.display_name.as_deref(),
        }
    }

    pub fn artifacts(&self) -> &[String] {
        match self {
            HealthVerdict::Healthy(r) => &r.artifacts,
            HealthVerdict::Unhealthy(_) => &[],
        }
    }

    pub fn missing(&self) -> &[String] {
        match self {
            HealthVerdict::Healthy(_) => &[],
            HealthVerdict::Unhealthy(r) => &r.missing,
        }
    }
}
