use crate::models::AnalysisReport;
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub report: Arc<AnalysisReport>,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at < ttl
    }
}

/// Per-URL memo of finished analyses with a fixed freshness window.
pub struct MetricsCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MetricsCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::hours(1)),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a live entry; an expired one is evicted on the spot.
    pub async fn get(&self, key: &str) -> Option<CacheEntry> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return None,
                Some(entry) if entry.is_fresh(self.ttl, now) => return Some(entry.clone()),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        // another writer may have refreshed it between the two locks
        if let Some(entry) = entries.get(key) {
            if entry.is_fresh(self.ttl, now) {
                return Some(entry.clone());
            }
            entries.remove(key);
            debug!(key, "evicted stale cache entry");
        }
        None
    }

    pub async fn put(&self, key: &str, report: Arc<AnalysisReport>) -> CacheEntry {
        let entry = CacheEntry {
            key: key.to_string(),
            report,
            created_at: Utc::now(),
        };
        self.insert(entry.clone()).await;
        entry
    }

    /// Stores an entry as-is, overwriting any previous one for the key.
    pub async fn insert(&self, entry: CacheEntry) {
        self.entries.write().await.insert(entry.key.clone(), entry);
    }

    /// Drops every expired entry and returns how many went.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(self.ttl, now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
