//! API Key 校验
//!
//! 索引查到的行再做一次常量时间比较；`last_used` 更新失败不影响校验结果。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::{LinkpulseError, Result};
use crate::storage::{ApiKeyId, LinkGateway, UserId};
use crate::utils::password::constant_time_eq;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedKey {
    pub user_id: UserId,
    pub key_id: ApiKeyId,
}

pub struct ApiKeyValidator {
    gateway: Arc<dyn LinkGateway>,
    touch_in_background: bool,
}

impl ApiKeyValidator {
    pub fn new(gateway: Arc<dyn LinkGateway>, touch_in_background: bool) -> Self {
        Self {
            gateway,
            touch_in_background,
        }
    }

    pub fn from_config(gateway: Arc<dyn LinkGateway>) -> Self {
        let config = crate::config::get_config();
        Self::new(gateway, config.api_keys.touch_in_background)
    }

    pub async fn validate(&self, presented_key: &str) -> Result<AuthenticatedKey> {
        self.validate_at(presented_key, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        presented_key: &str,
        now: DateTime<Utc>,
    ) -> Result<AuthenticatedKey> {
        if presented_key.is_empty() {
            return Err(LinkpulseError::invalid_api_key("empty API key"));
        }

        let key = self
            .gateway
            .find_api_key_by_key(presented_key)
            .await?
            .filter(|k| constant_time_eq(&k.key, presented_key))
            .ok_or_else(|| LinkpulseError::invalid_api_key("unknown API key"))?;

        if key.is_expired_at(now) {
            debug!("API key {} expired", key.id);
            return Err(LinkpulseError::api_key_expired(format!(
                "API key {} expired",
                key.id
            )));
        }

        self.touch(key.id, now).await;

        Ok(AuthenticatedKey {
            user_id: key.user_id,
            key_id: key.id,
        })
    }

    async fn touch(&self, id: ApiKeyId, at: DateTime<Utc>) {
        if self.touch_in_background {
            let gateway = Arc::clone(&self.gateway);
            tokio::spawn(async move {
                if let Err(e) = gateway.touch_api_key_last_used(id, at).await {
                    warn!("Failed to update last_used for API key {}: {}", id, e);
                }
            });
        } else if let Err(e) = self.gateway.touch_api_key_last_used(id, at).await {
            warn!("Failed to update last_used for API key {}: {}", id, e);
        }
    }
}
