//! Webhook registration commands.

use anyhow::Result;
use hookline_core::GitClient;
use std::path::Path;

use super::load_config;

fn client(config_path: &Path) -> Result<Box<dyn GitClient>> {
    let config = load_config(config_path)?;
    Ok(hookline_providers::client_for(&config, reqwest::Client::new()))
}

pub async fn list(config_path: &Path) -> Result<()> {
    let hooks = client(config_path)?.list_webhooks().await?;
    if hooks.is_empty() {
        println!("No webhooks registered");
        return Ok(());
    }

    println!("{:<12} URL", "ID");
    for hook in hooks {
        println!("{:<12} {}", hook.id, hook.url);
    }
    Ok(())
}

pub async fn register(config_path: &Path, url: &str) -> Result<()> {
    client(config_path)?.register_webhook(url).await?;
    println!("Registered webhook {}", url);
    Ok(())
}

pub async fn delete(config_path: &Path, id: u64) -> Result<()> {
    client(config_path)?.delete_webhook(id).await?;
    println!("Deleted webhook {}", id);
    Ok(())
}
