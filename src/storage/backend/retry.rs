//! 存储操作重试
//!
//! 失败按"这次尝试是否确定没有生效"分类：
//! - `Contended`：锁冲突、死锁回滚、连接池获取超时，语句没有落盘，任何操作都可重放
//! - `Interrupted`：语句已发出但连接中途断开，COMMIT 是否到达未知
//! - `Permanent`：约束冲突、语法错误等，重放结果不会变
//!
//! 计数递增、点击事件、新建链接这些操作只能执行一次（`Replay::AtMostOnce`），
//! `Interrupted` 时不重放，否则一次点击可能被记两次。

use std::future::Future;
use std::ops::Deref;
use std::time::Duration;

use sea_orm::DbErr;
use sea_orm::error::RuntimeErr;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::DatabaseConfig;

/// 一次失败尝试的性质
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Contended,
    Interrupted,
    Permanent,
}

/// 操作能否在结果未知时重放
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Replay {
    /// 读取、`ON CONFLICT DO NOTHING` 写入、写固定值的 UPDATE
    Idempotent,
    /// 计数递增、追加事件、插入新行、删除（返回值依赖是否首次执行）
    AtMostOnce,
}

impl Replay {
    pub fn allows(self, kind: FailureKind) -> bool {
        match kind {
            FailureKind::Contended => true,
            FailureKind::Interrupted => self == Replay::Idempotent,
            FailureKind::Permanent => false,
        }
    }
}

// MySQL 死锁/锁等待超时，PostgreSQL 序列化失败/死锁/拿不到锁，
// SQLite BUSY/LOCKED 及其扩展码
const CONTENDED_CODES: &[&str] = &[
    "1213", "1205", "40001", "40P01", "55P03", "5", "6", "261", "262", "517", "773",
];

pub fn classify(err: &DbErr) -> FailureKind {
    match err {
        DbErr::ConnectionAcquire(_) => FailureKind::Contended,
        DbErr::Conn(_) => FailureKind::Interrupted,
        DbErr::Exec(runtime_err) | DbErr::Query(runtime_err) => classify_runtime(runtime_err),
        _ => FailureKind::Permanent,
    }
}

/// 连接层面的失败（对调用方表现为 StoreUnavailable）
pub fn is_transient(err: &DbErr) -> bool {
    classify(err) != FailureKind::Permanent
}

fn classify_runtime(err: &RuntimeErr) -> FailureKind {
    match err {
        RuntimeErr::SqlxError(sqlx_err) => {
            use sea_orm::sqlx::Error as SqlxError;

            let inner: &SqlxError = sqlx_err.deref();
            if let Some(db_err) = inner.as_database_error() {
                return match db_err.code() {
                    Some(code) if CONTENDED_CODES.contains(&code.as_ref()) => {
                        FailureKind::Contended
                    }
                    Some(_) => FailureKind::Permanent,
                    None => classify_message(&db_err.message().to_lowercase()),
                };
            }
            match inner {
                SqlxError::PoolTimedOut => FailureKind::Contended,
                SqlxError::Io(_) | SqlxError::PoolClosed | SqlxError::WorkerCrashed => {
                    FailureKind::Interrupted
                }
                other => classify_message(&other.to_string().to_lowercase()),
            }
        }
        RuntimeErr::Internal(msg) => classify_message(&msg.to_lowercase()),
        #[allow(unreachable_patterns)]
        _ => FailureKind::Permanent,
    }
}

fn classify_message(msg: &str) -> FailureKind {
    const CONTENDED: &[&str] = &[
        "deadlock",
        "lock wait timeout",
        "database is locked",
        "database table is locked",
        "sqlite_busy",
        "serialization failure",
    ];
    const INTERRUPTED: &[&str] = &[
        "connection reset",
        "connection closed",
        "broken pipe",
        "error communicating with database",
    ];

    if CONTENDED.iter().any(|p| msg.contains(p)) {
        FailureKind::Contended
    } else if INTERRUPTED.iter().any(|p| msg.contains(p)) {
        FailureKind::Interrupted
    } else {
        FailureKind::Permanent
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 2000,
        }
    }
}

impl From<&DatabaseConfig> for RetryConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_retries: config.retry_count,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms.max(config.retry_base_delay_ms),
        }
    }
}

impl RetryConfig {
    /// 第 `attempt` 次重试前的等待：指数增长，封顶后加 0-25% 抖动
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exp.min(self.max_delay_ms);
        let jitter = rand::random_range(0..=capped / 4);
        Duration::from_millis(capped.saturating_add(jitter))
    }
}

pub async fn with_retry<T, F, Fut>(
    operation_name: &str,
    config: RetryConfig,
    replay: Replay,
    mut operation: F,
) -> Result<T, DbErr>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    let mut attempt = 0;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("'{}' succeeded after {} retries", operation_name, attempt);
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let kind = classify(&err);
        if !replay.allows(kind) {
            if kind == FailureKind::Interrupted {
                warn!(
                    "'{}' interrupted, outcome unknown, not replaying: {}",
                    operation_name, err
                );
            } else {
                debug!("'{}' failed ({:?}): {}", operation_name, kind, err);
            }
            return Err(err);
        }
        if attempt >= config.max_retries {
            warn!(
                "'{}' gave up after {} attempts: {}",
                operation_name,
                attempt + 1,
                err
            );
            return Err(err);
        }

        attempt += 1;
        let delay = config.delay_for(attempt);
        warn!(
            "'{}' failed ({:?}, attempt {}/{}): {}; retrying in {:?}",
            operation_name,
            kind,
            attempt,
            config.max_retries + 1,
            err,
            delay
        );
        sleep(delay).await;
    }
}
