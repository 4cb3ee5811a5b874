//! Read/write project versions and their files on disk.
//!
//! Layout under the store root:
//!
//! ```text
//! .sitegen/projects/<project>/
//!     config.json                 # last GenerationConfig submitted
//!     versions/<n>/version.json   # GenerationVersion
//!     versions/<n>/files.json     # Vec<VirtualFile>
//! ```
//!
//! Versions are append-only: a new version never rewrites the files of an
//! earlier one. Version numbers are allocated safely across concurrent
//! callers; writes to a single version are expected to come from one
//! writer at a time.

use crate::files::VirtualFile;
use crate::site::GenerationConfig;
use crate::version::{GenerationVersion, Trigger, VersionStatus};
use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const STORE_DIR: &str = ".sitegen";
const PROJECTS_DIR: &str = "projects";
const VERSIONS_DIR: &str = "versions";
const VERSION_FILE: &str = "version.json";
const FILES_FILE: &str = "files.json";
const CONFIG_FILE: &str = "config.json";

/// Filesystem-backed store of projects, versions, and files.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

/// Reject identifiers that could escape the store directory.
pub fn validate_project_id(project_id: &str) -> Result<()> {
    if project_id.is_empty()
        || project_id.len() > 64
        || !project_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!(
            "invalid project id '{}': use 1-64 characters from [A-Za-z0-9_-]",
            project_id
        );
    }
    Ok(())
}

impl ProjectStore {
    /// Open a store rooted at `root` (the directory that holds `.sitegen/`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn project_dir(&self, project_id: &str) -> Result<PathBuf> {
        validate_project_id(project_id)?;
        Ok(self
            .root
            .join(STORE_DIR)
            .join(PROJECTS_DIR)
            .join(project_id))
    }

    fn version_dir(&self, project_id: &str, version: u32) -> Result<PathBuf> {
        Ok(self
            .project_dir(project_id)?
            .join(VERSIONS_DIR)
            .join(version.to_string()))
    }

    /// Version numbers present for a project, ascending. Empty if none.
    pub fn list_version_numbers(&self, project_id: &str) -> Result<Vec<u32>> {
        let dir = self.project_dir(project_id)?.join(VERSIONS_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut numbers: Vec<u32> = fs::read_dir(&dir)
            .with_context(|| format!("failed to list versions in {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// All version records for a project, oldest first.
    pub fn list_versions(&self, project_id: &str) -> Result<Vec<GenerationVersion>> {
        self.list_version_numbers(project_id)?
            .into_iter()
            .map(|n| self.load_version(project_id, n))
            .collect()
    }

    /// Start a new version numbered one past the current maximum.
    ///
    /// The version directory is claimed with a non-recursive create, so
    /// concurrent callers never share a number: the loser of a race moves
    /// on to the next one.
    pub fn create_version(
        &self,
        project_id: &str,
        trigger: Trigger,
        parent_version: Option<u32>,
    ) -> Result<GenerationVersion> {
        let versions_dir = self.project_dir(project_id)?.join(VERSIONS_DIR);
        fs::create_dir_all(&versions_dir).with_context(|| {
            format!("failed to create versions directory {}", versions_dir.display())
        })?;
        let mut next = self
            .list_version_numbers(project_id)?
            .last()
            .map_or(1, |n| n + 1);
        let dir = loop {
            let dir = versions_dir.join(next.to_string());
            match fs::create_dir(&dir) {
                Ok(()) => break dir,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => next += 1,
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("failed to create version directory {}", dir.display())
                    });
                }
            }
        };

        let mut version = GenerationVersion::new(project_id, next, trigger);
        version.parent_version = parent_version;
        self.write_version(&version)?;
        write_json(&dir.join(FILES_FILE), &Vec::<VirtualFile>::new())?;
        tracing::debug!(project = project_id, version = next, %trigger, "created version");
        Ok(version)
    }

    pub fn load_version(&self, project_id: &str, version: u32) -> Result<GenerationVersion> {
        let path = self.version_dir(project_id, version)?.join(VERSION_FILE);
        read_json(&path)
    }

    fn write_version(&self, version: &GenerationVersion) -> Result<()> {
        let path = self
            .version_dir(&version.project_id, version.version_number)?
            .join(VERSION_FILE);
        write_json(&path, version)
    }

    /// Most recent version regardless of status.
    pub fn latest_version(&self, project_id: &str) -> Result<Option<GenerationVersion>> {
        match self.list_version_numbers(project_id)?.last() {
            Some(&n) => self.load_version(project_id, n).map(Some),
            None => Ok(None),
        }
    }

    /// Most recent version whose status is `complete`.
    pub fn latest_complete_version(&self, project_id: &str) -> Result<Option<GenerationVersion>> {
        for n in self.list_version_numbers(project_id)?.into_iter().rev() {
            let version = self.load_version(project_id, n)?;
            if version.status == VersionStatus::Complete {
                return Ok(Some(version));
            }
        }
        Ok(None)
    }

    /// Move a version to a new status. Terminal statuses stamp `completed_at`.
    pub fn update_status(
        &self,
        project_id: &str,
        version: u32,
        status: VersionStatus,
        error: Option<String>,
    ) -> Result<GenerationVersion> {
        let mut record = self.load_version(project_id, version)?;
        if record.status.is_terminal() && record.status != status {
            anyhow::bail!(
                "version {} of '{}' is already {}; refusing to mark it {}",
                version,
                project_id,
                record.status,
                status
            );
        }
        record.status = status;
        record.error = error;
        if status.is_terminal() {
            record.completed_at = Some(Utc::now());
        }
        self.write_version(&record)?;
        Ok(record)
    }

    pub fn load_files(&self, project_id: &str, version: u32) -> Result<Vec<VirtualFile>> {
        let path = self.version_dir(project_id, version)?.join(FILES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    /// Insert or replace one file in a version that is still generating.
    pub fn upsert_file(&self, project_id: &str, version: u32, file: VirtualFile) -> Result<()> {
        self.ensure_writable(project_id, version)?;
        let mut files = self.load_files(project_id, version)?;
        match files.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => *existing = file,
            None => files.push(file),
        }
        let path = self.version_dir(project_id, version)?.join(FILES_FILE);
        write_json(&path, &files)
    }

    /// Replace a generating version's whole file set and record its size.
    pub fn replace_files(&self, project_id: &str, version: u32, files: &[VirtualFile]) -> Result<()> {
        self.ensure_writable(project_id, version)?;
        let path = self.version_dir(project_id, version)?.join(FILES_FILE);
        write_json(&path, &files)?;
        let mut record = self.load_version(project_id, version)?;
        record.file_count = files.len();
        self.write_version(&record)
    }

    fn ensure_writable(&self, project_id: &str, version: u32) -> Result<()> {
        let record = self.load_version(project_id, version)?;
        if record.status.is_terminal() {
            anyhow::bail!(
                "version {} of '{}' is {} and can no longer change",
                version,
                project_id,
                record.status
            );
        }
        Ok(())
    }

    pub fn save_config(&self, project_id: &str, config: &GenerationConfig) -> Result<()> {
        let dir = self.project_dir(project_id)?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create project directory {}", dir.display()))?;
        write_json(&dir.join(CONFIG_FILE), config)
    }

    pub fn load_config(&self, project_id: &str) -> Result<Option<GenerationConfig>> {
        let path = self.project_dir(project_id)?.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("failed to parse {}", path.display()))
}

/// Write via a temp file and rename so readers never see a partial document.
fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
