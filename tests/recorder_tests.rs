//! ClickRecorder tests
//!
//! Counter accuracy under concurrency on SQLite, and best-effort event
//! handling against the failure-injecting mock.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{MockGateway, link, new_link, sqlite_storage};
use linkpulse::errors::LinkpulseError;
use linkpulse::services::ClickRecorder;
use linkpulse::storage::{ClickMetadata, LinkGateway, LinkId};
use sea_orm::ConnectionTrait;

fn metadata(n: usize) -> ClickMetadata {
    ClickMetadata {
        ip_address: Some(format!("203.0.113.{}", n % 250)),
        user_agent: Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0".to_string()),
        referrer: if n % 2 == 0 {
            Some("https://news.example".to_string())
        } else {
            None
        },
        ..Default::default()
    }
}

// =============================================================================
// SQLite
// =============================================================================

#[cfg(test)]
mod sqlite_tests {
    use super::*;

    #[tokio::test]
    async fn test_single_record() {
        let (storage, _temp) = sqlite_storage().await;
        let created = storage
            .insert_link(new_link("one", "https://example.com"))
            .await
            .unwrap();

        let recorder = ClickRecorder::new(storage.clone() as Arc<dyn LinkGateway>);
        recorder.record(created.id, metadata(1)).await.unwrap();

        let link = storage.find_link_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(link.clicks, 1);
        assert_eq!(storage.count_click_events(created.id).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_records_are_exact() {
        let (storage, _temp) = sqlite_storage().await;
        let created = storage
            .insert_link(new_link("busy", "https://example.com"))
            .await
            .unwrap();

        let recorder = ClickRecorder::new(storage.clone() as Arc<dyn LinkGateway>);
        let mut handles = Vec::new();
        for n in 0..100 {
            let recorder = recorder.clone();
            let id = created.id;
            handles.push(tokio::spawn(
                async move { recorder.record(id, metadata(n)).await },
            ));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let link = storage.find_link_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(link.clicks, 100);
        assert_eq!(storage.count_click_events(created.id).await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_missing_link_is_not_found() {
        let (storage, _temp) = sqlite_storage().await;
        let recorder = ClickRecorder::new(storage.clone() as Arc<dyn LinkGateway>);

        let err = recorder
            .record(LinkId(4242), ClickMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LinkpulseError::LinkNotFound(_)));
        assert_eq!(storage.count_click_events(LinkId(4242)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_metadata_stored_as_given() {
        let (storage, _temp) = sqlite_storage().await;
        let created = storage
            .insert_link(new_link("meta", "https://example.com"))
            .await
            .unwrap();

        let meta = ClickMetadata {
            ip_address: Some("2001:db8::1".to_string()),
            user_agent: Some("curl/8.5.0".to_string()),
            referrer: None,
            country: Some("NL".to_string()),
            city: Some("Amsterdam".to_string()),
            device: Some("pc".to_string()),
            browser: None,
            os: Some("Linux".to_string()),
            clicked_at: None,
        };
        ClickRecorder::new(storage.clone() as Arc<dyn LinkGateway>)
            .record(created.id, meta)
            .await
            .unwrap();

        let events = storage.recent_click_events(created.id, 10).await.unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.ip_address.as_deref(), Some("2001:db8::1"));
        assert_eq!(event.user_agent.as_deref(), Some("curl/8.5.0"));
        assert_eq!(event.referrer, None);
        assert_eq!(event.country.as_deref(), Some("NL"));
        assert_eq!(event.city.as_deref(), Some("Amsterdam"));
        assert_eq!(event.browser, None);
        assert_eq!(event.os.as_deref(), Some("Linux"));
    }

    #[tokio::test]
    async fn test_rejected_event_rolls_back_then_counts_once() {
        let (storage, _temp) = sqlite_storage().await;
        let created = storage
            .insert_link(new_link("guarded", "https://example.com"))
            .await
            .unwrap();
        storage
            .get_db()
            .execute_unprepared(
                "CREATE TRIGGER reject_click_events BEFORE INSERT ON click_events \
                 BEGIN SELECT RAISE(ABORT, 'click_events is read-only'); END;",
            )
            .await
            .unwrap();

        let recorder = ClickRecorder::new(storage.clone() as Arc<dyn LinkGateway>);
        recorder.record(created.id, metadata(0)).await.unwrap();
        recorder.record(created.id, metadata(1)).await.unwrap();

        // 事务回滚了第一次递增，退回路径各补一次
        let link = storage.find_link_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(link.clicks, 2);
        assert_eq!(storage.count_click_events(created.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_record_detached_completes_independently() {
        let (storage, _temp) = sqlite_storage().await;
        let created = storage
            .insert_link(new_link("bg", "https://example.com"))
            .await
            .unwrap();

        let recorder = ClickRecorder::new(storage.clone() as Arc<dyn LinkGateway>);
        let handles: Vec<_> = (0..10)
            .map(|n| recorder.record_detached(created.id, metadata(n)))
            .collect();
        // 调用方已经返回，后台任务照常完成
        drop(recorder);
        for handle in handles {
            handle.await.unwrap();
        }

        let link = storage.find_link_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(link.clicks, 10);
    }
}

// =============================================================================
// Failure injection
// =============================================================================

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_event_insert_failure_still_counts() {
        let gateway = MockGateway::new();
        gateway.add_link(link(1, "abc", "https://example.com")).await;
        gateway.fail_event_insert.store(true, Ordering::SeqCst);

        let recorder = ClickRecorder::new(gateway.clone() as Arc<dyn LinkGateway>);
        recorder.record(LinkId(1), metadata(0)).await.unwrap();

        assert_eq!(gateway.clicks(LinkId(1)).await, 1);
        assert_eq!(gateway.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_click_write_falls_back_to_counter() {
        let gateway = MockGateway::new();
        gateway.add_link(link(1, "abc", "https://example.com")).await;
        gateway.increment_failures.store(1, Ordering::SeqCst);

        let recorder = ClickRecorder::new(gateway.clone() as Arc<dyn LinkGateway>);
        recorder.record(LinkId(1), metadata(0)).await.unwrap();

        // 计数只加一次
        assert_eq!(gateway.clicks(LinkId(1)).await, 1);
        assert_eq!(gateway.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_counter_failure_is_returned() {
        let gateway = MockGateway::new();
        gateway.add_link(link(1, "abc", "https://example.com")).await;
        gateway.increment_failures.store(2, Ordering::SeqCst);

        let recorder = ClickRecorder::new(gateway.clone() as Arc<dyn LinkGateway>);
        let err = recorder.record(LinkId(1), metadata(0)).await.unwrap_err();

        assert!(matches!(err, LinkpulseError::StoreUnavailable(_)));
        assert_eq!(gateway.clicks(LinkId(1)).await, 0);
    }

    #[tokio::test]
    async fn test_missing_link_not_retried_as_counter_only() {
        let gateway = MockGateway::new();
        let recorder = ClickRecorder::new(gateway.clone() as Arc<dyn LinkGateway>);

        let err = recorder.record(LinkId(9), metadata(0)).await.unwrap_err();
        assert!(matches!(err, LinkpulseError::LinkNotFound(_)));
        assert_eq!(gateway.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_unknown_commit_outcome_not_counted_again() {
        let gateway = MockGateway::new();
        gateway.add_link(link(1, "abc", "https://example.com")).await;
        gateway.lose_commit_ack.store(true, Ordering::SeqCst);

        let recorder = ClickRecorder::new(gateway.clone() as Arc<dyn LinkGateway>);
        let err = recorder.record(LinkId(1), metadata(0)).await.unwrap_err();

        assert!(matches!(err, LinkpulseError::WriteOutcomeUnknown(_)));
        assert_eq!(gateway.clicks(LinkId(1)).await, 1);
    }

    #[tokio::test]
    async fn test_detached_failure_is_swallowed() {
        let gateway = MockGateway::new();
        let recorder = ClickRecorder::new(gateway.clone() as Arc<dyn LinkGateway>);

        // 任务本身不 panic，错误只记录日志
        recorder
            .record_detached(LinkId(404), ClickMetadata::default())
            .await
            .unwrap();
    }
}
