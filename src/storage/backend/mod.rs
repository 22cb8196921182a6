//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod api_keys;
mod clicks;
mod connection;
mod converters;
mod gateway;
mod links;
pub mod retry;
mod tags;

use sea_orm::{DatabaseConnection, DbErr};
use tracing::info;

use crate::errors::{LinkpulseError, Result};

pub use connection::{connect_generic, connect_sqlite, run_migrations};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(LinkpulseError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 重试耗尽后的错误归类：连接类错误对上层表现为 StoreUnavailable
pub(crate) fn map_db_err(context: &str, err: DbErr) -> LinkpulseError {
    if retry::is_transient(&err) {
        LinkpulseError::store_unavailable(format!("{}: {}", context, err))
    } else {
        LinkpulseError::database_operation(format!("{}: {}", context, err))
    }
}

/// 只能执行一次的写入：连接中途断开时不归为 StoreUnavailable，调用方不应补写
pub(crate) fn map_write_err(context: &str, err: DbErr) -> LinkpulseError {
    if retry::classify(&err) == retry::FailureKind::Interrupted {
        LinkpulseError::write_outcome_unknown(format!("{}: {}", context, err))
    } else {
        map_db_err(context, err)
    }
}

/// do_nothing 命中冲突时，不同后端返回的形态不一致
pub(super) fn conflict_ignored(result: std::result::Result<(), DbErr>) -> std::result::Result<bool, DbErr> {
    match result {
        Ok(()) => Ok(true),
        Err(DbErr::RecordNotInserted) => Ok(false),
        Err(e) => {
            let err_str = e.to_string().to_lowercase();
            if err_str.contains("no rows") || err_str.contains("record not inserted") {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(LinkpulseError::database_config(
                "DATABASE_URL 未设置".to_string(),
            ));
        }

        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig::from(&config.database);

        let db = match backend_name {
            "sqlite" => connect_sqlite(database_url).await?,
            "mariadb" => connect_generic(database_url, "mysql").await?,
            other => connect_generic(database_url, other).await?,
        };

        let storage = SeaOrmStorage {
            db,
            backend_name: backend_name.to_string(),
            retry_config,
        };

        run_migrations(&storage.db).await?;

        info!(
            "{} storage initialized",
            storage.backend_name.to_uppercase()
        );
        Ok(storage)
    }

    /// 按全局配置的 database_url 建立连接
    pub async fn from_config() -> Result<Self> {
        let config = crate::config::get_config();
        let database_url = config.database.database_url.clone();
        let backend = infer_backend_from_url(&database_url)?;
        Self::new(&database_url, &backend).await
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
