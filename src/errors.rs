//! Typed error hierarchy for repogate.
//!
//! - `RepoPathError` - path guard rejections (the only errors that cross the
//!   service boundary besides storage failures)
//! - `StoreError` - state file could not be written
//! - `ServiceError` - what a façade operation can fail with
//! - `DocError` - scoped document reads

use repogate_common::constants::{FORBIDDEN_REPO_PATH, INVALID_REPO_PATH};
use thiserror::Error;

/// Rejection of a user-supplied repository path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepoPathError {
    /// Empty, unresolvable or relative input.
    #[error("{0}")]
    Invalid(String),

    /// Outside every allowed root.
    #[error("{0}")]
    Forbidden(String),
}

impl RepoPathError {
    /// Machine-readable code carried on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            RepoPathError::Invalid(_) => INVALID_REPO_PATH,
            RepoPathError::Forbidden(_) => FORBIDDEN_REPO_PATH,
        }
    }

    /// HTTP-equivalent status.
    pub fn status_code(&self) -> u16 {
        match self {
            RepoPathError::Invalid(_) => 400,
            RepoPathError::Forbidden(_) => 403,
        }
    }
}

/// Failure to persist repository state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create app data directory at {path}: {source}")]
    CreateDir {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize repository state: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write repository state at {path}: {source}")]
    Write {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a `RepositoryService` operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Path(#[from] RepoPathError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from the scoped document reader.
#[derive(Debug, Error)]
pub enum DocError {
    #[error(transparent)]
    Path(#[from] RepoPathError),

    #[error("Failed to read document at {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_path_error_codes_and_statuses() {
        let invalid = RepoPathError::Invalid("repoPath is required".into());
        assert_eq!(invalid.code(), "INVALID_REPO_PATH");
        assert_eq!(invalid.status_code(), 400);
        assert_eq!(invalid.to_string(), "repoPath is required");

        let forbidden = RepoPathError::Forbidden("outside".into());
        assert_eq!(forbidden.code(), "FORBIDDEN_REPO_PATH");
        assert_eq!(forbidden.status_code(), 403);
    }

    #[test]
    fn store_error_write_carries_path() {
        let path = std::path::PathBuf::from("/data/repository-state.json");
        let err = StoreError::Write {
            path: path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        match &err {
            StoreError::Write { path: p, source } => {
                assert_eq!(p, &path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            _ => panic!("Expected Write"),
        }
        assert!(err.to_string().contains("repository-state.json"));
    }

    #[test]
    fn service_error_converts_from_path_error() {
        let err: ServiceError = RepoPathError::Forbidden("nope".into()).into();
        match &err {
            ServiceError::Path(RepoPathError::Forbidden(msg)) => assert_eq!(msg, "nope"),
            _ => panic!("Expected ServiceError::Path(Forbidden)"),
        }
        assert_eq!(err.to_string(), "nope");
    }

    #[test]
    fn doc_error_converts_from_path_error() {
        let err: DocError = RepoPathError::Invalid("bad".into()).into();
        assert!(matches!(err, DocError::Path(RepoPathError::Invalid(_))));
    }

    #[test]
    fn all_error_types_implement_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&RepoPathError::Invalid("x".into()));
        assert_std_error(&ServiceError::Path(RepoPathError::Invalid("x".into())));
        assert_std_error(&DocError::Path(RepoPathError::Invalid("x".into())));
    }
}
