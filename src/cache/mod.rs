//! 跳转解析缓存
//!
//! 正向缓存存放链接记录（TTL 不超过链接剩余有效期），负缓存记录不存在的短码。
//! 缓存只影响是否访问存储，过期与密码校验每次都对记录重新执行。

mod link_cache;
mod negative_cache;

use std::time::Duration;

use tracing::trace;

use crate::config::ResolverConfig;
use crate::storage::ShortLink;

pub use link_cache::MokaLinkCache;
pub use negative_cache::MokaNegativeCache;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 命中记录
    Found(ShortLink),
    /// 近期确认过不存在
    NotFound,
    /// 未命中，需要查询存储
    Miss,
}

pub struct ResolverCache {
    links: MokaLinkCache,
    missing: MokaNegativeCache,
}

impl ResolverCache {
    pub fn new(capacity: u64, default_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            links: MokaLinkCache::new(capacity, default_ttl),
            missing: MokaNegativeCache::new(capacity, negative_ttl),
        }
    }

    /// `cache_enabled = false` 时返回 None
    pub fn from_config(config: &ResolverConfig) -> Option<Self> {
        if !config.cache_enabled {
            return None;
        }
        Some(Self::new(
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
            Duration::from_secs(config.negative_ttl_secs),
        ))
    }

    pub async fn get(&self, code: &str) -> CacheResult {
        if let Some(link) = self.links.get(code).await {
            trace!("Link cache hit: {}", code);
            return CacheResult::Found(link);
        }
        if self.missing.contains(code) {
            return CacheResult::NotFound;
        }
        CacheResult::Miss
    }

    pub async fn insert(&self, link: ShortLink) {
        self.missing.remove(&link.short_code).await;
        self.links.insert(link).await;
    }

    pub async fn mark_missing(&self, code: &str) {
        self.missing.mark(code).await;
    }

    pub async fn invalidate(&self, code: &str) {
        self.links.remove(code).await;
        self.missing.remove(code).await;
    }
}
