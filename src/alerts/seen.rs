use alloy::primitives::B256;
use moka::future::Cache;
use std::time::Duration;

/// Transaction hashes already alerted on, bounded by age and count.
///
/// Entries expire `ttl` after insertion; past `capacity` the cache evicts
/// on its own schedule.
pub struct SeenSet {
    hashes: Cache<B256, ()>,
}

impl SeenSet {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let hashes = Cache::builder()
            .max_capacity(capacity.max(1) as u64)
            .time_to_live(ttl)
            .build();
        Self { hashes }
    }

    /// Record `hash`. Returns `false` if it was already present.
    pub async fn insert(&self, hash: B256) -> bool {
        self.hashes.entry(hash).or_insert(()).await.is_fresh()
    }

    pub fn contains(&self, hash: &B256) -> bool {
        self.hashes.contains_key(hash)
    }

    /// Approximate; pending evictions are applied first.
    pub async fn len(&self) -> u64 {
        self.hashes.run_pending_tasks().await;
        self.hashes.entry_count()
    }
}
