//! `storageface remote-tree` – print the files of a hub repository as a tree.

use anyhow::{Context, Result};
use storageface_core::config::StorageFaceConfig;
use storageface_core::hub::HubClient;
use storageface_core::job::{RepoId, RepoRef, RepoType};
use storageface_core::tree::remote_tree;

use super::resolve_token;

pub async fn run_remote_tree(
    cfg: &StorageFaceConfig,
    repo: &str,
    repo_type: RepoType,
    token: Option<String>,
) -> Result<()> {
    let repo = RepoRef {
        id: RepoId::parse(repo)?,
        repo_type,
    };
    let token = resolve_token(token);
    let client = HubClient::from_config(cfg)?;
    let label = repo.to_string();
    let files = tokio::task::spawn_blocking(move || client.list_files(&repo, &token))
        .await
        .context("listing task failed")?
        .with_context(|| format!("could not list {}", label))?;
    if files.is_empty() {
        println!("{} has no files.", label);
    } else {
        print!("{}", remote_tree(&files));
    }
    Ok(())
}
