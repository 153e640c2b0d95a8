use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::RECENT_LIMIT;
use crate::verdict::HealthyReport;

/// Durable projection of a healthy verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRepoRecord {
    pub repo_path: PathBuf,
    pub artifacts: Vec<String>,
    pub validated_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl PersistedRepoRecord {
    pub fn from_healthy(report: &HealthyReport, last_active_at: DateTime<Utc>) -> Self {
        Self {
            repo_path: report.repo_path.clone(),
            artifacts: report.artifacts.clone(),
            validated_at: report.validated_at,
            last_active_at,
            display_name: report.display_name.clone(),
        }
    }
}

/// Active repository plus the most-recently-used list, as stored on disk.
///
/// `recent` never holds more than [`RECENT_LIMIT`] entries and never holds two
/// entries with the same `repo_path`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryState {
    #[serde(default, deserialize_with = "lenient_record")]
    pub active: Option<PersistedRepoRecord>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub recent: Vec<PersistedRepoRecord>,
}

impl RepositoryState {
    /// Make `record` active and move it to the front of `recent`.
    pub fn activate(&mut self, record: PersistedRepoRecord) {
        self.recent.retain(|entry| entry.repo_path != record.repo_path);
        self.recent.insert(0, record.clone());
        self.recent.truncate(RECENT_LIMIT);
        self.active = Some(record);
    }

    /// Drop the active record, and `failed` from `recent` when given.
    pub fn deactivate(&mut self, failed: Option<&Path>) {
        self.active = None;
        if let Some(path) = failed {
            self.recent.retain(|entry| entry.repo_path != path);
        }
    }

    /// Forget `path` entirely: out of `recent`, and out of `active` if it matches.
    pub fn forget(&mut self, path: &Path) {
        self.recent.retain(|entry| entry.repo_path != path);
        if self
            .active
            .as_ref()
            .is_some_and(|active| active.repo_path == path)
        {
            self.active = None;
        }
    }

    /// UI-facing list: active first, then recent entries not already listed.
    pub fn repository_list(&self) -> Vec<RepositoryEntry> {
        let mut list: Vec<RepositoryEntry> = Vec::new();
        for record in self.active.iter().chain(self.recent.iter()) {
            if list.iter().any(|entry| entry.path == record.repo_path) {
                continue;
            }
            list.push(RepositoryEntry::from(record));
        }
        list
    }
}

/// One row of the repository picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryEntry {
    pub id: String,
    pub name: String,
    pub path: PathBuf,
    pub artifacts: Vec<String>,
    pub validated_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl From<&PersistedRepoRecord> for RepositoryEntry {
    fn from(record: &PersistedRepoRecord) -> Self {
        let path_text = record.repo_path.to_string_lossy().to_string();
        let derived = path_text
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .last()
            .unwrap_or(&path_text)
            .to_string();
        let name = record
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or(derived);
        Self {
            id: path_text,
            name,
            path: record.repo_path.clone(),
            artifacts: record.artifacts.clone(),
            validated_at: record.validated_at,
            last_active_at: record.last_active_at,
        }
    }
}

/// Accept anything for `recent`; a non-array value reads as an empty list.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<PersistedRepoRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeList {
        List(Vec<PersistedRepoRecord>),
        Other(IgnoredAny),
    }

    Ok(match MaybeList::deserialize(deserializer)? {
        MaybeList::List(list) => list,
        MaybeList::Other(_) => Vec::new(),
    })
}

/// Accept anything for `active`; a value that is not a record reads as `None`.
fn lenient_record<'de, D>(deserializer: D) -> Result<Option<PersistedRepoRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeRecord {
        Record(PersistedRepoRecord),
        Other(IgnoredAny),
    }

    Ok(match MaybeRecord::deserialize(deserializer)? {
        MaybeRecord::Record(record) => Some(record),
        MaybeRecord::Other(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> PersistedRepoRecord {
        PersistedRepoRecord {
            repo_path: PathBuf::from(path),
            artifacts: vec![".bmad/bmm/config.yaml".into()],
            validated_at: Utc::now(),
            last_active_at: Utc::now(),
            display_name: None,
        }
    }

    #[test]
    fn activate_moves_existing_entry_to_front() {
        let mut state = RepositoryState::default();
        state.activate(record("/a"));
        state.activate(record("/b"));
        state.activate(record("/a"));

        let paths: Vec<_> = state.recent.iter().map(|r| r.repo_path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(state.active.unwrap().repo_path, PathBuf::from("/a"));
    }

    #[test]
    fn activate_truncates_to_recent_limit() {
        let mut state = RepositoryState::default();
        for i in 0..(RECENT_LIMIT + 3) {
            state.activate(record(&format!("/repo-{i}")));
        }
        assert_eq!(state.recent.len(), RECENT_LIMIT);
        assert_eq!(
            state.recent[0].repo_path,
            PathBuf::from(format!("/repo-{}", RECENT_LIMIT + 2))
        );
    }

    #[test]
    fn deactivate_with_path_drops_it_from_recent() {
        let mut state = RepositoryState::default();
        state.activate(record("/a"));
        state.activate(record("/b"));
        state.deactivate(Some(Path::new("/b")));
        assert!(state.active.is_none());
        assert_eq!(state.recent.len(), 1);
        assert_eq!(state.recent[0].repo_path, PathBuf::from("/a"));
    }

    #[test]
    fn deactivate_without_path_keeps_recent() {
        let mut state = RepositoryState::default();
        state.activate(record("/a"));
        state.deactivate(None);
        assert!(state.active.is_none());
        assert_eq!(state.recent.len(), 1);
    }

    #[test]
    fn forget_clears_matching_active() {
        let mut state = RepositoryState::default();
        state.activate(record("/a"));
        state.forget(Path::new("/a"));
        assert!(state.active.is_none());
        assert!(state.recent.is_empty());
    }

    #[test]
    fn forget_keeps_unrelated_active() {
        let mut state = RepositoryState::default();
        state.activate(record("/a"));
        state.activate(record("/b"));
        state.forget(Path::new("/a"));
        assert_eq!(state.active.unwrap().repo_path, PathBuf::from("/b"));
    }

    #[test]
    fn repository_list_puts_active_first_without_duplicates() {
        let mut state = RepositoryState::default();
        state.activate(record("/a"));
        state.activate(record("/b"));
        state.active = Some(record("/a"));

        let list = state.repository_list();
        let names: Vec<_> = list.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn repository_entry_prefers_trimmed_display_name() {
        let mut rec = record("/home/dev/project");
        rec.display_name = Some("  My Project ".into());
        let entry = RepositoryEntry::from(&rec);
        assert_eq!(entry.name, "My Project");
        assert_eq!(entry.id, "/home/dev/project");

        rec.display_name = Some("   ".into());
        assert_eq!(RepositoryEntry::from(&rec).name, "project");
    }

    #[test]
    fn state_tolerates_missing_and_malformed_fields() {
        let state: RepositoryState = serde_json::from_str(r#"{"recent": "nope"}"#).unwrap();
        assert_eq!(state, RepositoryState::default());

        let state: RepositoryState = serde_json::from_str("{}").unwrap();
        assert_eq!(state, RepositoryState::default());
    }

    #[test]
    fn malformed_active_keeps_valid_recent() {
        let stored = record("/work/repo");
        let recent = serde_json::to_value(vec![stored.clone()]).unwrap();
        let doc = serde_json::json!({
            "active": {"repoPath": "/work/old", "artifacts": [], "validatedAt": "2024-01-01T00:00:00Z"},
            "recent": recent,
        });

        let state: RepositoryState = serde_json::from_value(doc).unwrap();
        assert!(state.active.is_none());
        assert_eq!(state.recent, vec![stored]);

        let state: RepositoryState =
            serde_json::from_str(r#"{"active": 42, "recent": []}"#).unwrap();
        assert!(state.active.is_none());
    }

    #[test]
    fn state_serialises_both_top_level_keys() {
        let json = serde_json::to_value(RepositoryState::default()).unwrap();
        assert!(json["active"].is_null());
        assert_eq!(json["recent"], serde_json::json!([]));
    }
}
