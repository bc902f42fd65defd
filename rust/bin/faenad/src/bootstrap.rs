//! Bootstrap: start-up checks and catalog seeding.
//!
//! When faenad starts:
//! 1. Verify the config names a data directory and a valid catalog.
//! 2. Insert the configured reference data (existing names are kept).

use faena::service::FaenaService;
use tracing::info;

use crate::config::ServerConfig;

/// Verify server configuration before any storage is opened.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    config
        .catalog
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid [catalog] section: {}", e))?;
    Ok(())
}

/// Seed species, categories, diseases, part types and licence holders.
pub fn seed_catalog(svc: &FaenaService, config: &ServerConfig) -> anyhow::Result<()> {
    svc.seed_catalog(&config.catalog)
        .map_err(|e| anyhow::anyhow!("failed to seed catalog: {}", e))?;
    let especies = svc
        .list_especies()
        .map_err(|e| anyhow::anyhow!("failed to read catalog: {}", e))?;
    if especies.is_empty() {
        tracing::warn!("catalog has no species; herds cannot declare head counts");
    } else {
        info!("{} species available", especies.len());
    }
    Ok(())
}
