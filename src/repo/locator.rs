//! Bounded breadth-first search for the project config file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use repogate_common::constants::{
    CONFIG_BASENAME, CONFIG_DIR_NAME, IGNORED_DIRS, PREFERRED_CONFIG_PARENT, SEARCH_MAX_DEPTH,
};
use tracing::debug;

/// Finds `bmm/config.yaml` under a repository root.
///
/// The two preferred locations (`.bmad/bmm/config.yaml`, `bmm/config.yaml`)
/// are checked first. Otherwise directories are visited breadth-first so the
/// shallowest match wins; traversal never goes below `max_depth` and never
/// enters a directory named in `ignored`. Unreadable directories count as empty.
#[derive(Debug, Clone)]
pub struct ConfigLocator {
    pub max_depth: usize,
    pub ignored: Vec<String>,
}

impl Default for ConfigLocator {
    fn default() -> Self {
        Self {
            max_depth: SEARCH_MAX_DEPTH,
            ignored: IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ConfigLocator {
    pub async fn find(&self, repo_root: &Path) -> Option<PathBuf> {
        let preferred = [
            repo_root
                .join(PREFERRED_CONFIG_PARENT)
                .join(CONFIG_DIR_NAME)
                .join(CONFIG_BASENAME),
            repo_root.join(CONFIG_DIR_NAME).join(CONFIG_BASENAME),
        ];
        for candidate in preferred {
            if exists(&candidate).await {
                return Some(candidate);
            }
        }

        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        queue.push_back((repo_root.to_path_buf(), 0));

        while let Some((dir, depth)) = queue.pop_front() {
            if let Some(found) = config_in_dir(&dir).await {
                debug!(config = %found.display(), depth, "config located");
                return Some(found);
            }

            if depth < self.max_depth {
                for child in self.child_dirs(&dir) {
                    queue.push_back((child, depth + 1));
                }
            }

            tokio::task::yield_now().await;
        }

        debug!(root = %repo_root.display(), "no config found");
        None
    }

    /// Child directories in enumeration order; symlinks are not followed.
    fn child_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                return Vec::new();
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                !self.ignored.iter().any(|ignored| ignored.as_str() == name)
            })
            .map(|entry| entry.path())
            .collect()
    }
}

/// `dir/bmm/config.yaml`, or `dir/config.yaml` when `dir` itself is named `bmm`.
async fn config_in_dir(dir: &Path) -> Option<PathBuf> {
    let nested = dir.join(CONFIG_DIR_NAME).join(CONFIG_BASENAME);
    if exists(&nested).await {
        return Some(nested);
    }

    let is_config_dir = dir
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase() == CONFIG_DIR_NAME)
        .unwrap_or(false);
    if is_config_dir {
        let direct = dir.join(CONFIG_BASENAME);
        if exists(&direct).await {
            return Some(direct);
        }
    }
    None
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
