use crate::services::cache::MetricsCache;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info};

/// Periodically drops expired cache entries, independent of request traffic.
pub async fn run_cache_sweeper(cache: Arc<MetricsCache>, every: Duration) {
    info!(interval_secs = every.as_secs(), "starting cache sweeper");

    let mut ticker = tokio::time::interval(every);
    // the first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let evicted = cache.sweep().await;
        if evicted > 0 {
            let remaining = cache.len().await;
            info!(evicted, remaining, "swept expired cache entries");
        } else {
            debug!("cache sweep found nothing to evict");
        }
    }
}
