//! Thin blocking client for a Hugging Face style hub.
//!
//! Only what an uploader needs: check a token, look up or create a
//! repository, list its files, and commit one file per request. Every call
//! runs under the configured `RetryPolicy`; callers above this layer
//! (the upload driver) never retry.

mod api;
mod commit;
mod http;

pub use api::{RepoInfo, Sibling, WhoAmI};

use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

use crate::config::StorageFaceConfig;
use crate::error::{JobError, UploadError};
use crate::job::{RepoRef, UploadJob};
use crate::retry::{run_with_retry, RetryPolicy};
use crate::uploader::{FileUpload, Uploader};

use http::{Method, Request};

const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Whether `ensure_repo` found the repository or had to create it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    Existing,
    Created,
}

#[derive(Debug, Clone)]
pub struct HubClient {
    endpoint: Url,
    retry: RetryPolicy,
    connect_timeout: Duration,
    max_file_size: u64,
}

impl HubClient {
    /// Client for `endpoint` (e.g. `https://huggingface.co`) with default retry and timeouts.
    pub fn new(endpoint: &str) -> Result<Self> {
        let mut endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid hub endpoint '{}'", endpoint))?;
        if endpoint.cannot_be_a_base() {
            anyhow::bail!("invalid hub endpoint '{}'", endpoint);
        }
        // Url::join replaces the last segment unless the path ends with '/'.
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        Ok(Self {
            endpoint,
            retry: RetryPolicy::default(),
            connect_timeout: Duration::from_secs(30),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        })
    }

    pub fn from_config(cfg: &StorageFaceConfig) -> Result<Self> {
        Ok(Self::new(&cfg.endpoint)?
            .with_retry_policy(cfg.retry_policy())
            .with_connect_timeout(cfg.connect_timeout())
            .with_max_file_size(cfg.max_file_size_bytes()))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Files larger than `bytes` fail with `UploadError::TooLarge` before being read.
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn url(&self, path: &str) -> Result<String, UploadError> {
        self.endpoint
            .join(path)
            .map(String::from)
            .map_err(|e| UploadError::InvalidResponse(format!("bad url for {}: {}", path, e)))
    }

    fn repo_path(repo: &RepoRef) -> String {
        format!(
            "api/{}/{}/{}",
            repo.repo_type.api_segment(),
            repo.id.owner(),
            repo.id.name()
        )
    }

    fn get(&self, path: &str, token: &str) -> Result<http::Response, UploadError> {
        let url = self.url(path)?;
        run_with_retry(&self.retry, || {
            http::perform(
                &Request {
                    method: Method::Get,
                    url: &url,
                    token,
                    body: None,
                },
                self.connect_timeout,
                None,
            )
        })
    }

    /// Account name the token belongs to. A 401 means the token is invalid.
    pub fn whoami(&self, token: &str) -> Result<String, UploadError> {
        let resp = self.get("api/whoami-v2", token)?;
        Ok(resp.json::<WhoAmI>()?.name)
    }

    /// Repository metadata, or `None` if the hub answers 404.
    pub fn repo_info(&self, repo: &RepoRef, token: &str) -> Result<Option<RepoInfo>, UploadError> {
        match self.get(&Self::repo_path(repo), token) {
            Ok(resp) => Ok(Some(resp.json()?)),
            Err(e) if e.status() == Some(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates the repository. An "already exists" answer (409) counts as success.
    pub fn create_repo(&self, repo: &RepoRef, private: bool, token: &str) -> Result<(), UploadError> {
        let url = self.url("api/repos/create")?;
        let body = serde_json::to_vec(&api::CreateRepoRequest::new(repo, private))
            .map_err(|e| UploadError::InvalidResponse(e.to_string()))?;
        let res = run_with_retry(&self.retry, || {
            http::perform(
                &Request {
                    method: Method::Post,
                    url: &url,
                    token,
                    body: Some((body.as_slice(), "application/json")),
                },
                self.connect_timeout,
                None,
            )
        });
        match res {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(409) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn ensure_repo(&self, repo: &RepoRef, private: bool, token: &str) -> Result<RepoStatus, UploadError> {
        if let Some(info) = self.repo_info(repo, token)? {
            if private && info.private == Some(false) {
                tracing::warn!(repo = %repo, "repository already exists and is public; private flag ignored");
            }
            return Ok(RepoStatus::Existing);
        }
        self.create_repo(repo, private, token)?;
        Ok(RepoStatus::Created)
    }

    /// Paths of every file in the repository's main revision.
    pub fn list_files(&self, repo: &RepoRef, token: &str) -> Result<Vec<String>, UploadError> {
        match self.repo_info(repo, token)? {
            Some(info) => Ok(info.file_paths()),
            None => Err(UploadError::Http {
                status: 404,
                message: format!("repository {} not found", repo),
            }),
        }
    }

    /// Commits one local file to `destination` on the main branch.
    /// `progress` receives cumulative bytes of the file sent.
    pub fn commit_file(
        &self,
        repo: &RepoRef,
        token: &str,
        file: FileUpload<'_>,
        progress: &mut dyn FnMut(u64),
    ) -> Result<(), UploadError> {
        let io_err = |e: std::io::Error| UploadError::Io {
            path: file.local_path.to_path_buf(),
            source: e,
        };
        let on_disk = std::fs::metadata(file.local_path).map_err(io_err)?.len();
        if on_disk > self.max_file_size {
            return Err(UploadError::TooLarge {
                path: file.local_path.to_path_buf(),
                size: on_disk,
                limit: self.max_file_size,
            });
        }
        let content = std::fs::read(file.local_path).map_err(io_err)?;
        let size = content.len() as u64;
        let body = commit::commit_body(file.destination, &content);
        drop(content);
        let url = self.url(&format!("{}/commit/main", Self::repo_path(repo)))?;

        run_with_retry(&self.retry, || {
            // Scale body bytes (base64 + JSON) back to file bytes.
            let mut on_progress = |sent: u64, total: u64| {
                if total > 0 {
                    progress(((sent as u128 * size as u128) / total as u128) as u64);
                }
            };
            http::perform(
                &Request {
                    method: Method::Post,
                    url: &url,
                    token,
                    body: Some((body.as_slice(), commit::CONTENT_TYPE)),
                },
                self.connect_timeout,
                Some(&mut on_progress as &mut dyn FnMut(u64, u64)),
            )
            .map(|_| ())
        })?;
        progress(size);
        Ok(())
    }
}

impl Uploader for HubClient {
    fn prepare(&self, job: &UploadJob) -> Result<(), JobError> {
        let user = self.whoami(&job.token).map_err(JobError::Auth)?;
        tracing::info!(user = %user, "authenticated with hub");
        let status = self
            .ensure_repo(&job.repo, job.private, &job.token)
            .map_err(|e| JobError::Repo {
                repo: job.repo.id.to_string(),
                source: e,
            })?;
        match status {
            RepoStatus::Existing => tracing::info!(repo = %job.repo, "repository exists"),
            RepoStatus::Created => {
                tracing::info!(repo = %job.repo, private = job.private, "created repository")
            }
        }
        Ok(())
    }

    fn upload_file(
        &self,
        job: &UploadJob,
        file: FileUpload<'_>,
        progress: &mut dyn FnMut(u64),
    ) -> Result<(), UploadError> {
        self.commit_file(&job.repo, &job.token, file, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{RepoId, RepoType};

    #[test]
    fn endpoint_gets_trailing_slash_so_join_keeps_prefix() {
        let c = HubClient::new("http://127.0.0.1:9000/hub").unwrap();
        assert_eq!(c.url("api/whoami-v2").unwrap(), "http://127.0.0.1:9000/hub/api/whoami-v2");
        let c = HubClient::new("https://huggingface.co").unwrap();
        assert_eq!(c.url("api/whoami-v2").unwrap(), "https://huggingface.co/api/whoami-v2");
    }

    #[test]
    fn rejects_non_url_endpoint() {
        assert!(HubClient::new("not a url").is_err());
        assert!(HubClient::new("mailto:a@b.c").is_err());
    }

    #[test]
    fn repo_path_uses_plural_kind() {
        let repo = RepoRef {
            id: RepoId::parse("alice/data").unwrap(),
            repo_type: RepoType::Dataset,
        };
        assert_eq!(HubClient::repo_path(&repo), "api/datasets/alice/data");
    }

    #[test]
    fn missing_local_file_is_an_io_error_without_network() {
        let c = HubClient::new("http://127.0.0.1:9").unwrap();
        let repo = RepoRef {
            id: RepoId::parse("alice/data").unwrap(),
            repo_type: RepoType::Model,
        };
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.bin");
        let err = c
            .commit_file(
                &repo,
                "t",
                FileUpload {
                    local_path: &missing,
                    destination: "gone.bin",
                    size: 3,
                },
                &mut |_| {},
            )
            .unwrap_err();
        assert!(matches!(err, UploadError::Io { .. }));
    }

    #[test]
    fn oversized_file_fails_without_network() {
        let c = HubClient::new("http://127.0.0.1:9")
            .unwrap()
            .with_retry_policy(RetryPolicy::none())
            .with_max_file_size(4);
        let repo = RepoRef {
            id: RepoId::parse("alice/data").unwrap(),
            repo_type: RepoType::Dataset,
        };
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.bin");
        std::fs::write(&big, b"12345").unwrap();
        let mut reported = Vec::new();
        let err = c
            .commit_file(
                &repo,
                "t",
                FileUpload {
                    local_path: &big,
                    destination: "big.bin",
                    size: 5,
                },
                &mut |n| reported.push(n),
            )
            .unwrap_err();
        match err {
            UploadError::TooLarge { size, limit, .. } => {
                assert_eq!(size, 5);
                assert_eq!(limit, 4);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
        assert!(reported.is_empty());
    }
}
