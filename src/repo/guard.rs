//! Path guard: resolve, canonicalize and authorize user-supplied paths.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::debug;

use crate::errors::RepoPathError;
use crate::util::{is_path_inside, normalize_lexically};

/// Environment variable holding extra allowed roots, separated like `PATH`.
pub const ALLOWLIST_ENV: &str = "BMAD_REPO_ALLOWLIST";

/// Canonical directories under which a repo root must reside.
///
/// Built once from a list of source paths; each source contributes its
/// normalized absolute form and, when it exists, its symlink-resolved form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedRoots {
    sources: Vec<PathBuf>,
    roots: Vec<PathBuf>,
}

impl AllowedRoots {
    pub fn new(sources: Vec<PathBuf>) -> Self {
        let roots = expand_roots(&sources);
        Self { sources, roots }
    }

    /// Re-resolve the stored sources (symlink targets may have moved).
    pub fn refresh(&mut self) {
        self.roots = expand_roots(&self.sources);
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| is_path_inside(root, path))
    }
}

/// Home directory and current working directory, when they can be determined.
pub fn default_sources() -> Vec<PathBuf> {
    let mut sources = Vec::new();
    if let Some(home) = dirs::home_dir() {
        sources.push(home);
    }
    if let Ok(cwd) = std::env::current_dir() {
        sources.push(cwd);
    }
    sources
}

/// Entries of [`ALLOWLIST_ENV`], trimmed, blanks dropped.
pub fn env_sources() -> Vec<PathBuf> {
    std::env::var_os(ALLOWLIST_ENV)
        .map(|value| parse_allowlist(&value))
        .unwrap_or_default()
}

/// Split a `PATH`-style list, trimming entries and dropping blanks.
pub fn parse_allowlist(value: &OsStr) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter_map(|p| {
            let text = p.to_string_lossy().trim().to_string();
            (!text.is_empty()).then(|| PathBuf::from(text))
        })
        .collect()
}

fn expand_roots(sources: &[PathBuf]) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = Vec::new();
    let resolved: Vec<PathBuf> = sources.iter().filter_map(|s| absolutize(s)).collect();
    for root in &resolved {
        if !roots.contains(root) {
            roots.push(root.clone());
        }
    }
    for root in &resolved {
        if let Ok(real) = std::fs::canonicalize(root) {
            if !roots.contains(&real) {
                roots.push(real);
            }
        }
    }
    roots
}

fn absolutize(path: &Path) -> Option<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some(normalize_lexically(&joined))
}

/// Authorizes raw paths against a swappable set of allowed roots.
#[derive(Debug)]
pub struct PathGuard {
    roots: RwLock<AllowedRoots>,
}

impl PathGuard {
    pub fn new(roots: AllowedRoots) -> Self {
        Self {
            roots: RwLock::new(roots),
        }
    }

    /// Resolve `raw` to a canonical absolute path inside the allowed roots.
    ///
    /// Both the literal (normalized) form and the symlink-resolved form must
    /// pass containment. A path that cannot be canonicalized (not yet created,
    /// permission denied) is checked in its normalized form only.
    pub async fn authorize(&self, raw: &str) -> Result<PathBuf, RepoPathError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RepoPathError::Invalid("repoPath is required".into()));
        }

        let resolved = absolutize(Path::new(trimmed))
            .filter(|p| p.is_absolute())
            .ok_or_else(|| RepoPathError::Invalid("repoPath must be absolute".into()))?;
        self.assert_allowed(&resolved)?;

        let canonical = match tokio::fs::canonicalize(&resolved).await {
            Ok(real) => real,
            Err(e) => {
                debug!(path = %resolved.display(), error = %e, "canonicalize failed, using resolved path");
                resolved
            }
        };
        self.assert_allowed(&canonical)?;
        Ok(canonical)
    }

    fn assert_allowed(&self, path: &Path) -> Result<(), RepoPathError> {
        let allowed = self
            .roots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(path);
        if allowed {
            Ok(())
        } else {
            debug!(path = %path.display(), "path outside allowed roots");
            Err(RepoPathError::Forbidden(
                "repoPath is outside the allowed roots".into(),
            ))
        }
    }

    /// Snapshot of the effective roots.
    pub fn allowed_roots(&self) -> Vec<PathBuf> {
        self.roots
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .roots()
            .to_vec()
    }

    /// Replace the root set, e.g. after the environment changed.
    pub fn replace(&self, roots: AllowedRoots) {
        *self
            .roots
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = roots;
    }
}
