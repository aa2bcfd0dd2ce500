//! Mail Cache - cache maintenance tool
//!
//! Loads the configured cache file, applies the trim policy, writes it back
//! (dropping entries for files that no longer exist) and prints statistics.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mail_cache::{Cache, Config};

/// Main entry point for the cache maintenance tool.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Merge the on-disk cache into a fresh store
/// 4. Flush if the store is over its trim threshold
/// 5. Save, pruning scoped entries whose files are gone
/// 6. Print statistics as JSON
fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mail_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_prefix={:?}, version={}, trim_threshold={}",
        config.cache_prefix, config.version, config.trim_threshold
    );

    let mut cache = Cache::with_trim_threshold(config.trim_threshold);

    let loaded = cache.load(&config).context("failed to load cache file")?;
    info!("Loaded {} entries", loaded);

    if cache.trim() {
        info!("Cache exceeded {} entries and was flushed", config.trim_threshold);
    }

    let saved = cache.save(&config).context("failed to save cache file")?;
    info!("Saved {} entries", saved);

    let stats = serde_json::to_string_pretty(&cache.stats())
        .context("failed to serialize cache statistics")?;
    println!("{}", stats);

    Ok(())
}
