//! Shared test fixtures: temporary SQLite storage and an in-memory gateway
//! with failure injection.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use linkpulse::errors::{LinkpulseError, Result};
use linkpulse::storage::{
    ApiKey, ApiKeyId, LinkGateway, LinkId, NewClickEvent, NewShortLink, SeaOrmStorage, ShortLink,
    Tag, TagId, UserId,
};
use tempfile::TempDir;
use tokio::sync::Mutex;

// =============================================================================
// SQLite
// =============================================================================

pub async fn sqlite_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("linkpulse_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (Arc::new(storage), temp_dir)
}

pub fn new_link(code: &str, url: &str) -> NewShortLink {
    NewShortLink {
        original_url: url.to_string(),
        short_code: code.to_string(),
        created_at: Utc::now(),
        expires_at: None,
        password: None,
        owner: None,
        qr_code_url: None,
    }
}

// =============================================================================
// In-memory gateway
// =============================================================================

#[derive(Default)]
pub struct MockGateway {
    pub links: Mutex<HashMap<i64, ShortLink>>,
    pub events: Mutex<Vec<NewClickEvent>>,
    pub api_keys: Mutex<Vec<ApiKey>>,
    pub touches: Mutex<Vec<(ApiKeyId, DateTime<Utc>)>>,

    /// 查找调用次数（验证缓存与短码格式校验）
    pub lookups: AtomicUsize,
    /// 接下来 N 次计数递增返回 StoreUnavailable
    pub increment_failures: AtomicUsize,
    pub fail_event_insert: AtomicBool,
    pub fail_lookup: AtomicBool,
    pub fail_touch: AtomicBool,
    /// record_click 返回 WriteOutcomeUnknown（计数已加，提交确认丢失）
    pub lose_commit_ack: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn add_link(&self, link: ShortLink) {
        self.links.lock().await.insert(link.id.0, link);
    }

    pub async fn add_api_key(&self, key: ApiKey) {
        self.api_keys.lock().await.push(key);
    }

    pub async fn clicks(&self, id: LinkId) -> u64 {
        self.links
            .lock()
            .await
            .get(&id.0)
            .map(|l| l.clicks)
            .unwrap_or(0)
    }

    pub async fn event_count(&self) -> usize {
        self.events.lock().await.len()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

pub fn link(id: i64, code: &str, url: &str) -> ShortLink {
    ShortLink {
        id: LinkId(id),
        original_url: url.to_string(),
        short_code: code.to_string(),
        created_at: Utc::now(),
        expires_at: None,
        password: None,
        owner: None,
        qr_code_url: None,
        clicks: 0,
    }
}

pub fn api_key(id: i64, key: &str, user: &str, expires_at: Option<DateTime<Utc>>) -> ApiKey {
    ApiKey {
        id: ApiKeyId(id),
        key: key.to_string(),
        user_id: UserId::from(user),
        name: None,
        created_at: Utc::now(),
        last_used: None,
        expires_at,
    }
}

#[async_trait]
impl LinkGateway for MockGateway {
    async fn find_unique_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup.load(Ordering::SeqCst) {
            return Err(LinkpulseError::store_unavailable("connection refused"));
        }
        Ok(self
            .links
            .lock()
            .await
            .values()
            .find(|l| l.short_code == code)
            .cloned())
    }

    async fn find_link_by_id(&self, id: LinkId) -> Result<Option<ShortLink>> {
        Ok(self.links.lock().await.get(&id.0).cloned())
    }

    async fn atomic_increment_clicks(&self, id: LinkId) -> Result<()> {
        let pending = self.increment_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.increment_failures.store(pending - 1, Ordering::SeqCst);
            return Err(LinkpulseError::store_unavailable("database is locked"));
        }
        match self.links.lock().await.get_mut(&id.0) {
            Some(link) => {
                link.clicks += 1;
                Ok(())
            }
            None => Err(LinkpulseError::link_not_found(id.to_string())),
        }
    }

    async fn insert_click_event(&self, event: NewClickEvent) -> Result<()> {
        if self.fail_event_insert.load(Ordering::SeqCst) {
            return Err(LinkpulseError::database_operation("click_events is read-only"));
        }
        self.events.lock().await.push(event);
        Ok(())
    }

    async fn record_click(&self, event: NewClickEvent) -> Result<()> {
        let link_id = event.link_id;
        self.atomic_increment_clicks(link_id).await?;
        if self.lose_commit_ack.load(Ordering::SeqCst) {
            return Err(LinkpulseError::write_outcome_unknown("connection reset during commit"));
        }
        // 与默认实现一致，事件失败不影响计数
        let _ = self.insert_click_event(event).await;
        Ok(())
    }

    async fn find_or_create_tag(&self, name: &str, owner: &UserId) -> Result<Tag> {
        Ok(Tag {
            id: TagId(1),
            name: name.to_string(),
            owner: owner.clone(),
        })
    }

    async fn upsert_link_tag(&self, _link_id: LinkId, _tag_id: TagId) -> Result<()> {
        Ok(())
    }

    async fn tags_for_link(&self, _link_id: LinkId) -> Result<Vec<Tag>> {
        Ok(Vec::new())
    }

    async fn find_api_key_by_key(&self, key: &str) -> Result<Option<ApiKey>> {
        Ok(self
            .api_keys
            .lock()
            .await
            .iter()
            .find(|k| k.key == key)
            .cloned())
    }

    async fn touch_api_key_last_used(&self, id: ApiKeyId, at: DateTime<Utc>) -> Result<()> {
        if self.fail_touch.load(Ordering::SeqCst) {
            return Err(LinkpulseError::store_unavailable("connection reset"));
        }
        self.touches.lock().await.push((id, at));
        Ok(())
    }
}
