use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod models;
mod services;

use services::{discovery::SwiftCli, store::SwiftStore, sync_service::SyncService};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args();

    tracing::info!(
        "Syncing {} file(s) into {}/{}",
        cfg.files.len(),
        cfg.container,
        cfg.path
    );

    // --- Wire the store behind its capability seams ---
    let store = SwiftStore::new(SwiftCli::default());
    let service = SyncService::new(store);

    // --- Run the sync pass ---
    let report = service.run(&cfg).await?;

    tracing::info!(
        "Sync complete: {} uploaded, {} unchanged",
        report.uploads(),
        report.unchanged.len()
    );

    Ok(())
}
