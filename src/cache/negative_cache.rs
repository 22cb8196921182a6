use std::time::Duration;

use moka::future::Cache;
use tracing::trace;

pub struct MokaNegativeCache {
    inner: Cache<String, ()>,
}

impl MokaNegativeCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        trace!(
            "MokaNegativeCache initialized: max_capacity={}, ttl={}s",
            max_capacity,
            ttl.as_secs()
        );

        Self { inner }
    }

    pub fn contains(&self, code: &str) -> bool {
        let hit = self.inner.contains_key(code);
        if hit {
            trace!("Negative cache hit for code: {}", code);
        }
        hit
    }

    pub async fn mark(&self, code: &str) {
        trace!("Marking code as not found: {}", code);
        self.inner.insert(code.to_string(), ()).await;
    }

    pub async fn remove(&self, code: &str) {
        self.inner.invalidate(code).await;
    }
}
