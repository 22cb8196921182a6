use std::time::{Duration, Instant};

use chrono::Utc;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use crate::storage::ShortLink;

/// TTL = min(default_ttl, 距 expires_at 的剩余时间)
struct ShortLinkExpiry {
    default_ttl: Duration,
}

impl ShortLinkExpiry {
    fn ttl_for(&self, link: &ShortLink) -> Duration {
        match link.expires_at {
            Some(expires_at) => {
                let remaining = (expires_at - Utc::now()).num_milliseconds();
                if remaining <= 0 {
                    // 已过期的记录仍可短暂缓存，解析时会返回 LinkExpired
                    Duration::from_secs(1).min(self.default_ttl)
                } else {
                    Duration::from_millis(remaining as u64).min(self.default_ttl)
                }
            }
            None => self.default_ttl,
        }
    }
}

impl Expiry<String, ShortLink> for ShortLinkExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &ShortLink,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(self.ttl_for(value))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &ShortLink,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(self.ttl_for(value))
    }
}

pub struct MokaLinkCache {
    inner: Cache<String, ShortLink>,
}

impl MokaLinkCache {
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(ShortLinkExpiry { default_ttl })
            .build();

        debug!(
            "MokaLinkCache initialized: max_capacity={}, default_ttl={}s",
            max_capacity,
            default_ttl.as_secs()
        );
        Self { inner }
    }

    pub async fn get(&self, code: &str) -> Option<ShortLink> {
        self.inner.get(code).await
    }

    pub async fn insert(&self, link: ShortLink) {
        self.inner.insert(link.short_code.clone(), link).await;
    }

    pub async fn remove(&self, code: &str) {
        self.inner.invalidate(code).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LinkId;

    fn link(expires_in: Option<chrono::Duration>) -> ShortLink {
        ShortLink {
            id: LinkId(1),
            original_url: "https://example.com".to_string(),
            short_code: "abc".to_string(),
            created_at: Utc::now(),
            expires_at: expires_in.map(|d| Utc::now() + d),
            password: None,
            owner: None,
            qr_code_url: None,
            clicks: 0,
        }
    }

    #[test]
    fn test_ttl_without_expiry_uses_default() {
        let expiry = ShortLinkExpiry {
            default_ttl: Duration::from_secs(300),
        };
        assert_eq!(expiry.ttl_for(&link(None)), Duration::from_secs(300));
    }

    #[test]
    fn test_ttl_capped_by_link_expiry() {
        let expiry = ShortLinkExpiry {
            default_ttl: Duration::from_secs(300),
        };
        let ttl = expiry.ttl_for(&link(Some(chrono::Duration::seconds(10))));
        assert!(ttl <= Duration::from_secs(10));
        assert!(ttl > Duration::from_secs(5));

        let far = expiry.ttl_for(&link(Some(chrono::Duration::days(30))));
        assert_eq!(far, Duration::from_secs(300));
    }

    #[test]
    fn test_ttl_for_already_expired() {
        let expiry = ShortLinkExpiry {
            default_ttl: Duration::from_secs(300),
        };
        let ttl = expiry.ttl_for(&link(Some(chrono::Duration::seconds(-10))));
        assert_eq!(ttl, Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_entry_evicted_when_link_expires() {
        let cache = MokaLinkCache::new(100, Duration::from_secs(300));
        cache
            .insert(link(Some(chrono::Duration::milliseconds(300))))
            .await;
        assert!(cache.get("abc").await.is_some());

        tokio::time::sleep(Duration::from_millis(600)).await;
        cache.inner.run_pending_tasks().await;

        assert!(cache.get("abc").await.is_none());
    }
}
