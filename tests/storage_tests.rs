//! SeaOrmStorage tests on SQLite

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{new_link, sqlite_storage};
use linkpulse::errors::LinkpulseError;
use linkpulse::storage::{ClickMetadata, LinkGateway, LinkId, NewClickEvent, TagId, UserId};

#[tokio::test]
async fn test_insert_and_find() {
    let (storage, _temp) = sqlite_storage().await;
    let mut link = new_link("find-me", "https://example.com/find");
    link.expires_at = Some(Utc::now() + Duration::days(3));
    link.qr_code_url = Some("https://qr.example/find-me.png".to_string());

    let created = storage.insert_link(link).await.unwrap();
    assert_eq!(created.clicks, 0);

    let by_code = storage.find_unique_by_code("find-me").await.unwrap().unwrap();
    assert_eq!(by_code.id, created.id);
    assert_eq!(by_code.original_url, "https://example.com/find");
    assert_eq!(
        by_code.qr_code_url.as_deref(),
        Some("https://qr.example/find-me.png")
    );
    assert!(by_code.expires_at.is_some());

    let by_id = storage.find_link_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(by_id.short_code, "find-me");
}

#[tokio::test]
async fn test_codes_are_case_sensitive() {
    let (storage, _temp) = sqlite_storage().await;
    storage
        .insert_link(new_link("Abc", "https://upper.example"))
        .await
        .unwrap();
    // 大小写不同视为不同短码
    storage
        .insert_link(new_link("abc", "https://lower.example"))
        .await
        .unwrap();

    let upper = storage.find_unique_by_code("Abc").await.unwrap().unwrap();
    let lower = storage.find_unique_by_code("abc").await.unwrap().unwrap();
    assert_eq!(upper.original_url, "https://upper.example");
    assert_eq!(lower.original_url, "https://lower.example");
    assert!(storage.find_unique_by_code("ABC").await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_code() {
    let (storage, _temp) = sqlite_storage().await;
    storage
        .insert_link(new_link("dup", "https://a.example"))
        .await
        .unwrap();

    let err = storage
        .insert_link(new_link("dup", "https://b.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkpulseError::LinkAlreadyExists(_)));
}

#[tokio::test]
async fn test_increment_missing_link() {
    let (storage, _temp) = sqlite_storage().await;
    let err = storage.atomic_increment_clicks(LinkId(77)).await.unwrap_err();
    assert!(matches!(err, LinkpulseError::LinkNotFound(_)));
}

#[tokio::test]
async fn test_increment_and_event_are_independent() {
    let (storage, _temp) = sqlite_storage().await;
    let created = storage
        .insert_link(new_link("inc", "https://example.com"))
        .await
        .unwrap();

    storage.atomic_increment_clicks(created.id).await.unwrap();
    storage.atomic_increment_clicks(created.id).await.unwrap();
    storage
        .insert_click_event(NewClickEvent::new(created.id, ClickMetadata::default()))
        .await
        .unwrap();

    let link = storage.find_link_by_id(created.id).await.unwrap().unwrap();
    assert_eq!(link.clicks, 2);
    assert_eq!(storage.count_click_events(created.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_recent_events_newest_first() {
    let (storage, _temp) = sqlite_storage().await;
    let created = storage
        .insert_link(new_link("recent", "https://example.com"))
        .await
        .unwrap();

    let base = Utc::now();
    for n in 0..5 {
        let mut event = NewClickEvent::new(
            created.id,
            ClickMetadata {
                referrer: Some(format!("https://ref{}.example", n)),
                ..Default::default()
            },
        );
        event.clicked_at = base + Duration::seconds(n);
        storage.insert_click_event(event).await.unwrap();
    }

    let events = storage.recent_click_events(created.id, 2).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].referrer.as_deref(), Some("https://ref4.example"));
    assert_eq!(events[1].referrer.as_deref(), Some("https://ref3.example"));
}

#[tokio::test]
async fn test_link_tag_upsert_is_idempotent() {
    let (storage, _temp) = sqlite_storage().await;
    let owner = UserId::from("alice");
    storage.ensure_user(&owner, None).await.unwrap();
    // 重复调用不报错
    storage
        .ensure_user(&owner, Some("alice@example.com"))
        .await
        .unwrap();

    let created = storage
        .insert_link(new_link("tagged", "https://example.com"))
        .await
        .unwrap();
    let tag = storage.find_or_create_tag("docs", &owner).await.unwrap();
    let again = storage.find_or_create_tag("docs", &owner).await.unwrap();
    assert_eq!(tag.id, again.id);

    storage.upsert_link_tag(created.id, tag.id).await.unwrap();
    storage.upsert_link_tag(created.id, tag.id).await.unwrap();

    let tags = storage.tags_for_link(created.id).await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "docs");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tag_creation_converges() {
    let (storage, _temp) = sqlite_storage().await;
    let owner = UserId::from("alice");
    storage.ensure_user(&owner, None).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let gateway = storage.clone() as Arc<dyn LinkGateway>;
        let owner = owner.clone();
        handles.push(tokio::spawn(async move {
            gateway.find_or_create_tag("shared", &owner).await
        }));
    }

    let mut ids: Vec<TagId> = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);
}

#[tokio::test]
async fn test_delete_missing_link() {
    let (storage, _temp) = sqlite_storage().await;
    assert!(!storage.delete_link(LinkId(5)).await.unwrap());
}
