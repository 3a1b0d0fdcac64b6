use anyhow::Result;
use moka::future::Cache;
use once_cell::sync::Lazy;
use std::time::Duration;

use crate::store::repos::Repos;
use crate::utils::identifier_filter;

/// true  => identifier is TAKEN
/// false => identifier is AVAILABLE (usually we store only taken)
pub static IDENTIFIER_CACHE: Lazy<Cache<String, bool>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(500_000) // tune based on memory
        .time_to_live(Duration::from_secs(86400)) // 24h TTL
        .build()
});

/// Mark a single identifier as taken
pub async fn mark_taken(identifier: &str) {
    IDENTIFIER_CACHE
        .insert(identifier.to_lowercase(), true)
        .await;
}

/// Check if an identifier is taken
pub async fn is_taken(identifier: &str) -> bool {
    IDENTIFIER_CACHE
        .get(&identifier.to_lowercase())
        .await
        .unwrap_or(false)
}

/// Forget an identifier after its record is deleted
pub async fn release(identifier: &str) {
    IDENTIFIER_CACHE.invalidate(&identifier.to_lowercase()).await;
}

/// Batch mark identifiers as taken
async fn batch_mark(identifiers: &[String]) {
    let futures: Vec<_> = identifiers
        .iter()
        .map(|id| IDENTIFIER_CACHE.insert(id.to_lowercase(), true))
        .collect();

    // Await all insertions concurrently
    futures::future::join_all(futures).await;
}

/// Load taken identifiers into the in-memory cache (batched)
pub async fn warmup_identifier_cache(repos: &Repos, batch_size: usize) -> Result<()> {
    let identifiers = identifier_filter::taken_identifiers(repos);

    for batch in identifiers.chunks(batch_size) {
        batch_mark(batch).await;
    }

    log::info!(
        "Identifier cache warmup complete: {} identifiers",
        identifiers.len()
    );

    Ok(())
}
