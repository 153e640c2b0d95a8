//! Line scan of the config text for `output_folder`, the only key consumed.

use regex::Regex;
use repogate_common::constants::PROJECT_ROOT_TOKEN;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::util::normalize_lexically;

static OUTPUT_FOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^output_folder:\s*(.+)$").unwrap());

static PROJECT_ROOT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", regex::escape(PROJECT_ROOT_TOKEN))).unwrap()
});

/// First `output_folder:` value, with one layer of matching quotes removed.
///
/// Blank lines and `#` comments are skipped; the key matches case-insensitively.
pub fn extract_output_folder(config_text: &str) -> Option<String> {
    for line in config_text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some(caps) = OUTPUT_FOLDER_REGEX.captures(trimmed) {
            let value = caps[1].trim();
            return Some(strip_quotes(value).trim().to_string());
        }
    }
    None
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.starts_with(quote) && value.ends_with(quote) {
            return if value.len() >= 2 {
                &value[1..value.len() - 1]
            } else {
                ""
            };
        }
    }
    value
}

/// Substitute `{project-root}` and resolve against the repo root.
pub fn resolve_output_folder(value: &str, repo_root: &Path) -> PathBuf {
    let root_text = repo_root.to_string_lossy();
    let templated = PROJECT_ROOT_REGEX.replace_all(value, regex::NoExpand(&root_text));
    let candidate = Path::new(templated.as_ref());
    if candidate.is_absolute() {
        normalize_lexically(candidate)
    } else {
        normalize_lexically(&repo_root.join(candidate))
    }
}
