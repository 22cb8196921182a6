//! 持久化网关
//!
//! 服务层只依赖这个 trait；`SeaOrmStorage` 是生产实现，测试里用内存 mock 注入故障。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::Result;
use crate::storage::models::{
    ApiKey, ApiKeyId, LinkId, NewClickEvent, ShortLink, Tag, TagId, UserId,
};

#[async_trait]
pub trait LinkGateway: Send + Sync {
    /// 按短码精确查找（大小写敏感）
    async fn find_unique_by_code(&self, code: &str) -> Result<Option<ShortLink>>;

    async fn find_link_by_id(&self, id: LinkId) -> Result<Option<ShortLink>>;

    /// `clicks = clicks + 1`，在存储侧完成。链接不存在返回 `LinkNotFound`
    async fn atomic_increment_clicks(&self, id: LinkId) -> Result<()>;

    async fn insert_click_event(&self, event: NewClickEvent) -> Result<()>;

    /// 计数加一并写入点击事件
    ///
    /// 默认实现分两步执行，计数成功后事件写入失败只记录警告。
    /// 返回错误时保证计数未变，支持事务的后端应覆盖为单事务写入。
    async fn record_click(&self, event: NewClickEvent) -> Result<()> {
        let link_id = event.link_id;
        self.atomic_increment_clicks(link_id).await?;
        if let Err(e) = self.insert_click_event(event).await {
            tracing::warn!("Click event for link {} dropped: {}", link_id, e);
        }
        Ok(())
    }

    /// 在 owner 的命名空间内查找或创建标签，并发调用收敛到同一行
    async fn find_or_create_tag(&self, name: &str, owner: &UserId) -> Result<Tag>;

    /// 已存在的关联静默成功
    async fn upsert_link_tag(&self, link_id: LinkId, tag_id: TagId) -> Result<()>;

    async fn tags_for_link(&self, link_id: LinkId) -> Result<Vec<Tag>>;

    async fn find_api_key_by_key(&self, key: &str) -> Result<Option<ApiKey>>;

    async fn touch_api_key_last_used(&self, id: ApiKeyId, at: DateTime<Utc>) -> Result<()>;
}
