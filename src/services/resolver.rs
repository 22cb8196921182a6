//! 短码解析
//!
//! 检查顺序固定：短码格式 → 存储查找 → 过期 → 是否需要密码 → 密码校验。
//! 过期判断在任何密码运算之前完成。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ResolverCache};
use crate::errors::{LinkpulseError, Result};
use crate::storage::{LinkGateway, LinkId, ShortLink};
use crate::utils::is_valid_short_code;
use crate::utils::password::verify_stored_password;

/// 解析成功的结果，`destination_url` 与存储的原值逐字节一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub destination_url: String,
    pub link_id: LinkId,
}

pub struct LinkResolver {
    gateway: Arc<dyn LinkGateway>,
    cache: Option<ResolverCache>,
}

impl LinkResolver {
    pub fn new(gateway: Arc<dyn LinkGateway>, cache: Option<ResolverCache>) -> Self {
        Self { gateway, cache }
    }

    /// 按全局 `resolver` 配置决定是否启用缓存
    pub fn from_config(gateway: Arc<dyn LinkGateway>) -> Self {
        let config = crate::config::get_config();
        Self::new(gateway, ResolverCache::from_config(&config.resolver))
    }

    pub fn without_cache(gateway: Arc<dyn LinkGateway>) -> Self {
        Self::new(gateway, None)
    }

    pub async fn resolve(
        &self,
        short_code: &str,
        supplied_password: Option<&str>,
    ) -> Result<ResolvedLink> {
        self.resolve_at(short_code, supplied_password, Utc::now())
            .await
    }

    /// 以给定时间判断过期
    pub async fn resolve_at(
        &self,
        short_code: &str,
        supplied_password: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ResolvedLink> {
        if !is_valid_short_code(short_code) {
            debug!("Rejected malformed short code: {:?}", short_code);
            return Err(LinkpulseError::link_not_found(short_code.to_string()));
        }

        let link = self
            .lookup(short_code)
            .await?
            .ok_or_else(|| LinkpulseError::link_not_found(short_code.to_string()))?;

        if link.is_expired_at(now) {
            debug!("Link expired: {}", short_code);
            return Err(LinkpulseError::link_expired(short_code.to_string()));
        }

        if link.is_password_protected()
            && let Some(stored) = link.password.as_deref()
        {
            let supplied = supplied_password
                .filter(|p| !p.is_empty())
                .ok_or_else(|| LinkpulseError::password_required(short_code.to_string()))?;

            let matched = verify_stored_password(supplied, stored).unwrap_or_else(|e| {
                warn!("Stored password for '{}' is unreadable: {}", short_code, e);
                false
            });
            if !matched {
                debug!("Password mismatch for {}", short_code);
                return Err(LinkpulseError::password_mismatch(short_code.to_string()));
            }
        }

        debug!("Resolved {} -> link {}", short_code, link.id);
        Ok(ResolvedLink {
            destination_url: link.original_url,
            link_id: link.id,
        })
    }

    /// 链接被修改或删除后调用
    pub async fn invalidate(&self, short_code: &str) {
        if let Some(cache) = &self.cache {
            cache.invalidate(short_code).await;
        }
    }

    async fn lookup(&self, code: &str) -> Result<Option<ShortLink>> {
        let Some(cache) = &self.cache else {
            return self.fetch(code).await;
        };

        match cache.get(code).await {
            CacheResult::Found(link) => Ok(Some(link)),
            CacheResult::NotFound => Ok(None),
            CacheResult::Miss => {
                let found = self.fetch(code).await?;
                match &found {
                    Some(link) => cache.insert(link.clone()).await,
                    None => cache.mark_missing(code).await,
                }
                Ok(found)
            }
        }
    }

    async fn fetch(&self, code: &str) -> Result<Option<ShortLink>> {
        self.gateway.find_unique_by_code(code).await.map_err(|e| {
            error!("Link lookup failed for {}: {}", code, e);
            // 对访问者而言任何存储故障都是 StoreUnavailable
            match e {
                LinkpulseError::DatabaseOperation(msg)
                | LinkpulseError::DatabaseConnection(msg) => LinkpulseError::store_unavailable(msg),
                other => other,
            }
        })
    }
}
