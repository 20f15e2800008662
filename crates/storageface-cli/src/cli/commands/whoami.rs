//! `storageface whoami` – validate a token against the hub.

use anyhow::{Context, Result};
use storageface_core::config::StorageFaceConfig;
use storageface_core::hub::HubClient;

use super::{resolve_token, TOKEN_ENV};

pub async fn run_whoami(cfg: &StorageFaceConfig, token: Option<String>) -> Result<()> {
    let token = resolve_token(token);
    if token.is_empty() {
        anyhow::bail!("no token given (use --token or set {})", TOKEN_ENV);
    }
    let client = HubClient::from_config(cfg)?;
    let result = tokio::task::spawn_blocking(move || client.whoami(&token))
        .await
        .context("whoami task failed")?;
    match result {
        Ok(name) => {
            println!("Logged in as {}", name);
            Ok(())
        }
        Err(e) if e.status() == Some(401) => anyhow::bail!("invalid token: {}", e),
        Err(e) => Err(e).context("could not reach the hub"),
    }
}
