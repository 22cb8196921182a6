use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::SeaOrmStorage;
use crate::errors::Result;
use crate::storage::gateway::LinkGateway;
use crate::storage::models::{ApiKey, ApiKeyId, LinkId, NewClickEvent, ShortLink, Tag, TagId, UserId};

#[async_trait]
impl LinkGateway for SeaOrmStorage {
    async fn find_unique_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        self.load_link_by_code(code).await
    }

    async fn find_link_by_id(&self, id: LinkId) -> Result<Option<ShortLink>> {
        self.load_link_by_id(id).await
    }

    async fn atomic_increment_clicks(&self, id: LinkId) -> Result<()> {
        self.increment_clicks(id).await
    }

    async fn insert_click_event(&self, event: NewClickEvent) -> Result<()> {
        self.insert_event(&event).await
    }

    async fn record_click(&self, event: NewClickEvent) -> Result<()> {
        self.record_click_txn(&event).await
    }

    async fn find_or_create_tag(&self, name: &str, owner: &UserId) -> Result<Tag> {
        self.find_or_create_tag_row(name, owner).await
    }

    async fn upsert_link_tag(&self, link_id: LinkId, tag_id: TagId) -> Result<()> {
        self.upsert_link_tag_row(link_id, tag_id).await
    }

    async fn tags_for_link(&self, link_id: LinkId) -> Result<Vec<Tag>> {
        self.load_tags_for_link(link_id).await
    }

    async fn find_api_key_by_key(&self, key: &str) -> Result<Option<ApiKey>> {
        self.load_api_key(key).await
    }

    async fn touch_api_key_last_used(&self, id: ApiKeyId, at: DateTime<Utc>) -> Result<()> {
        self.set_api_key_last_used(id, at).await
    }
}
