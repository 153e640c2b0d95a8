//! Shared path helpers for the repogate crate.

use std::path::{Component, Path, PathBuf};

/// Collapse `.` and `..` components without touching the filesystem.
///
/// `..` above the root stays at the root, matching how absolute paths resolve.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// True if `target` equals `base` or sits below it, compared segment by segment.
pub fn is_path_inside(base: &Path, target: &Path) -> bool {
    target.strip_prefix(base).is_ok()
}

/// Relative path from `base` to `target`, both absolute and normalized.
///
/// Returns `"."` when they are equal and uses `..` segments when `target`
/// lies outside `base`.
pub fn relative_display(base: &Path, target: &Path) -> String {
    let base_parts: Vec<Component> = base.components().collect();
    let target_parts: Vec<Component> = target.components().collect();
    let shared = base_parts
        .iter()
        .zip(target_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in shared..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[shared..] {
        rel.push(part.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        ".".to_string()
    } else {
        rel.to_string_lossy().to_string()
    }
}
