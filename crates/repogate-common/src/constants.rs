//! Fixed values both runtimes depend on.

/// Logical name reported in `missing` whenever the config file cannot be found or read.
pub const REQUIRED_CONFIG_ARTIFACT: &str = "bmm/config.yaml";

/// Directory that holds the config file.
pub const CONFIG_DIR_NAME: &str = "bmm";

/// Basename of the config file.
pub const CONFIG_BASENAME: &str = "config.yaml";

/// Hidden parent of the preferred config location (`.bmad/bmm/config.yaml`).
pub const PREFERRED_CONFIG_PARENT: &str = ".bmad";

/// Directory names never descended into while searching for the config.
pub const IGNORED_DIRS: [&str; 6] = [".git", "node_modules", ".next", "dist", "build", "out"];

/// Deepest directory level (root = 0) the config search visits.
pub const SEARCH_MAX_DEPTH: usize = 5;

/// Maximum number of entries kept in the recent list.
pub const RECENT_LIMIT: usize = 5;

/// File name of the persisted state under the app-data root.
pub const STATE_FILE_NAME: &str = "repository-state.json";

/// Placeholder substituted with the canonical repo path inside `output_folder`.
pub const PROJECT_ROOT_TOKEN: &str = "{project-root}";

/// Prefix every scoped document path must start with.
pub const DOCS_PREFIX: &str = "devDocs";

/// Workflow status document read by `status`.
pub const WORKFLOW_STATUS_DOC: &str = "devDocs/bmm-workflow-status.yaml";

/// Error codes carried by path-guard failures.
pub const INVALID_REPO_PATH: &str = "INVALID_REPO_PATH";
pub const FORBIDDEN_REPO_PATH: &str = "FORBIDDEN_REPO_PATH";
