//! Preload a JSON catalog into the on-disk media cache.
//!
//! ```text
//! cargo run -p core-preload --example preload_demo -- catalog.json
//! ```
//!
//! The catalog is an array of `{ id, title, videoUrl, audioUrl, quoteAudioUrl }`.

use anyhow::{Context, Result};
use bridge_desktop::{FsCacheStorage, MemoryObjectUrlStore, ReqwestHttpClient};
use core_preload::{ContentItem, MediaPreloader};
use core_runtime::config::PreloadConfig;
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )?;

    let path = std::env::args()
        .nth(1)
        .context("usage: preload_demo <catalog.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let catalog: Vec<ContentItem> = serde_json::from_str(&raw).context("parsing catalog")?;

    let storage = FsCacheStorage::in_default_location();
    println!("Cache root: {}", storage.root().display());

    let preloader = MediaPreloader::new(
        PreloadConfig::default(),
        Arc::new(ReqwestHttpClient::new()?),
        Some(Arc::new(storage)),
        Arc::new(MemoryObjectUrlStore::new()),
    )?;

    preloader.register(catalog);
    preloader.start_preload().await;

    let progress = preloader.progress();
    println!(
        "Loaded {}/{} ({}%)",
        progress.loaded, progress.total, progress.percentage
    );

    for id in preloader.registered_ids() {
        if let Some(report) = preloader.item_report(id) {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    preloader.cleanup(None);
    Ok(())
}
