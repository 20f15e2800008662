//! Upload job model: what to upload, where, and how many workers.
//!
//! An `UploadJob` is created once per user-initiated upload and never mutated
//! afterwards; workers share it through `Arc`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::JobError;

/// Kind of hub repository. Selects the API path segment (`models`, `datasets`, `spaces`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoType {
    Model,
    #[default]
    Dataset,
    Space,
}

impl RepoType {
    /// Plural path segment used by the hub API.
    pub fn api_segment(self) -> &'static str {
        match self {
            RepoType::Model => "models",
            RepoType::Dataset => "datasets",
            RepoType::Space => "spaces",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RepoType::Model => "model",
            RepoType::Dataset => "dataset",
            RepoType::Space => "space",
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated `owner/name` repository id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    /// Parses `owner/name` where both halves are non-empty and use only
    /// ASCII letters, digits, `-`, `_` and `.`. A half may not start or end
    /// with `.`, so `.` and `..` never reach a request URL.
    pub fn parse(s: &str) -> Result<Self, JobError> {
        let s = s.trim();
        let valid_part = |p: &str| {
            !p.is_empty()
                && !p.starts_with('.')
                && !p.ends_with('.')
                && p
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        match s.split_once('/') {
            Some((owner, name)) if valid_part(owner) && valid_part(name) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(JobError::InvalidRepoId(s.to_string())),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A repository on the hub: id plus type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub id: RepoId,
    pub repo_type: RepoType,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.repo_type)
    }
}

/// One user-initiated folder upload.
#[derive(Clone)]
pub struct UploadJob {
    pub folder: PathBuf,
    pub repo: RepoRef,
    pub token: String,
    /// Worker count; always at least 1.
    pub threads: usize,
    /// Only used when the repository has to be created.
    pub private: bool,
    /// Normalised destination folder inside the repository ("" = root).
    pub path_in_repo: String,
    pub ignore_patterns: Vec<String>,
}

// Manual impl so the token never lands in logs.
impl fmt::Debug for UploadJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadJob")
            .field("folder", &self.folder)
            .field("repo", &self.repo)
            .field("token", &"<redacted>")
            .field("threads", &self.threads)
            .field("private", &self.private)
            .field("path_in_repo", &self.path_in_repo)
            .field("ignore_patterns", &self.ignore_patterns)
            .finish()
    }
}

/// Builder-style input for `UploadJob::new`; mirrors what the CLI collects.
#[derive(Debug, Clone, Default)]
pub struct JobRequest {
    pub folder: PathBuf,
    pub repo_id: String,
    pub repo_type: RepoType,
    pub token: String,
    pub threads: usize,
    pub private: bool,
    pub path_in_repo: Option<String>,
    pub ignore_patterns: Vec<String>,
}

impl UploadJob {
    /// Validates the request and builds the job. Does not touch the network.
    pub fn new(req: JobRequest) -> Result<Self, JobError> {
        let token = req.token.trim().to_string();
        if token.is_empty() {
            return Err(JobError::MissingToken);
        }
        let id = RepoId::parse(&req.repo_id)?;
        if !req.folder.is_dir() {
            return Err(JobError::FolderNotFound(req.folder));
        }
        let path_in_repo = normalize_repo_path(req.path_in_repo.as_deref().unwrap_or(""))?;
        Ok(Self {
            folder: req.folder,
            repo: RepoRef {
                id,
                repo_type: req.repo_type,
            },
            token,
            threads: req.threads.max(1),
            private: req.private,
            path_in_repo,
            ignore_patterns: req.ignore_patterns,
        })
    }

    /// Re-checks what may have changed on disk since the job was built.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.token.is_empty() {
            return Err(JobError::MissingToken);
        }
        if !self.folder.is_dir() {
            return Err(JobError::FolderNotFound(self.folder.clone()));
        }
        Ok(())
    }

    /// Destination path in the repository for a file at `relative` (already `/`-separated).
    pub fn destination_for(&self, relative: &str) -> String {
        join_repo_path(&self.path_in_repo, relative)
    }

    /// Splits the job into one job per first-level sub-directory, each
    /// uploading to `<path_in_repo>/<dir name>`. Files directly in the root
    /// folder are not part of any returned job.
    pub fn split_first_level(&self) -> Result<Vec<UploadJob>, JobError> {
        let entries = std::fs::read_dir(&self.folder).map_err(|e| JobError::Scan {
            path: self.folder.clone(),
            source: e,
        })?;
        let mut dirs: Vec<(String, PathBuf)> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| JobError::Scan {
                path: self.folder.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_dir() {
                dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
            }
        }
        dirs.sort();
        Ok(dirs
            .into_iter()
            .map(|(name, folder)| UploadJob {
                folder,
                path_in_repo: join_repo_path(&self.path_in_repo, &name),
                ..self.clone()
            })
            .collect())
    }
}

/// Normalises a destination folder: `\` becomes `/`, empty and `.` components
/// are dropped, `..` is rejected.
pub fn normalize_repo_path(raw: &str) -> Result<String, JobError> {
    let replaced = raw.replace('\\', "/");
    let mut parts = Vec::new();
    for part in replaced.split('/') {
        match part.trim() {
            "" | "." => continue,
            ".." => return Err(JobError::InvalidPathInRepo(raw.to_string())),
            p => parts.push(p),
        }
    }
    Ok(parts.join("/"))
}

/// Joins a normalised base and a `/`-separated relative path.
pub fn join_repo_path(base: &str, relative: &str) -> String {
    let relative = relative.trim_start_matches('/');
    if base.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, relative)
    }
}
