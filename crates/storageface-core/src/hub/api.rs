//! JSON shapes of the hub endpoints we call.

use serde::{Deserialize, Serialize};

use crate::job::{RepoRef, RepoType};

#[derive(Debug, Clone, Deserialize)]
pub struct WhoAmI {
    pub name: String,
}

/// Subset of `GET /api/{kind}/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoInfo {
    #[serde(default)]
    pub private: Option<bool>,
    #[serde(default)]
    pub siblings: Vec<Sibling>,
}

impl RepoInfo {
    pub fn file_paths(&self) -> Vec<String> {
        self.siblings.iter().map(|s| s.rfilename.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sibling {
    pub rfilename: String,
}

/// Body of `POST /api/repos/create`.
#[derive(Debug, Serialize)]
pub(super) struct CreateRepoRequest<'a> {
    pub name: &'a str,
    pub organization: &'a str,
    pub private: bool,
    /// Omitted for models, which is the hub's default type.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub repo_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk: Option<&'static str>,
}

impl<'a> CreateRepoRequest<'a> {
    pub fn new(repo: &'a RepoRef, private: bool) -> Self {
        let (repo_type, sdk) = match repo.repo_type {
            RepoType::Model => (None, None),
            RepoType::Dataset => (Some("dataset"), None),
            // Spaces need an SDK; "static" serves the uploaded files as-is.
            RepoType::Space => (Some("space"), Some("static")),
        };
        Self {
            name: repo.id.name(),
            organization: repo.id.owner(),
            private,
            repo_type,
            sdk,
        }
    }
}
