//! Version snapshots of a project's generated output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Generating,
    Complete,
    Error,
}

impl VersionStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generating => f.write_str("generating"),
            Self::Complete => f.write_str("complete"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// What produced a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Create,
    Edit,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.write_str("create"),
            Self::Edit => f.write_str("edit"),
        }
    }
}

/// Append-only snapshot metadata. Files live alongside, keyed by version number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationVersion {
    pub project_id: String,
    /// Monotonically increasing per project, starting at 1.
    pub version_number: u32,
    pub status: VersionStatus,
    pub trigger: Trigger,
    /// Version this one was derived from (edits only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_version: Option<u32>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub file_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationVersion {
    pub fn new(project_id: &str, version_number: u32, trigger: Trigger) -> Self {
        Self {
            project_id: project_id.to_string(),
            version_number,
            status: VersionStatus::Generating,
            trigger,
            parent_version: None,
            started_at: Utc::now(),
            completed_at: None,
            file_count: 0,
            error: None,
        }
    }

    /// Wall-clock time from start to completion, if finished.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_version_is_generating() {
        let v = GenerationVersion::new("acme", 1, Trigger::Create);
        assert_eq!(v.status, VersionStatus::Generating);
        assert!(!v.status.is_terminal());
        assert!(v.duration().is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let v = GenerationVersion::new("acme", 3, Trigger::Edit);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["versionNumber"], 3);
        assert_eq!(json["status"], "generating");
        assert_eq!(json["trigger"], "edit");
        assert!(json.get("error").is_none());
    }
}
