//! 链接读写
//!
//! 查找走 `short_code` 唯一索引；删除在一个事务里连带清理点击事件和标签关联。

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, QueryFilter, SqlErr, TransactionTrait,
};
use tracing::info;

use super::converters::{model_to_shortlink, new_link_to_active_model};
use super::retry::Replay;
use super::{SeaOrmStorage, map_db_err, retry};
use crate::errors::{LinkpulseError, Result};
use crate::storage::models::{LinkId, NewShortLink, ShortLink};

use migration::entities::{click_event, link_tag, short_link};

impl SeaOrmStorage {
    pub(super) async fn load_link_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("find_link({})", code), self.retry_config, Replay::Idempotent, || async {
            short_link::Entity::find()
                .filter(short_link::Column::ShortCode.eq(code))
                .one(db)
                .await
        })
        .await
        .map_err(|e| map_db_err("查询短链接失败", e))?;

        Ok(model.map(model_to_shortlink))
    }

    pub(super) async fn load_link_by_id(&self, id: LinkId) -> Result<Option<ShortLink>> {
        let db = &self.db;
        let model = retry::with_retry(&format!("find_link_by_id({})", id), self.retry_config, Replay::Idempotent, || async {
            short_link::Entity::find_by_id(id.0).one(db).await
        })
        .await
        .map_err(|e| map_db_err("查询短链接失败", e))?;

        Ok(model.map(model_to_shortlink))
    }

    /// 插入新链接；短码冲突返回 `LinkAlreadyExists`
    pub async fn insert_link(&self, link: NewShortLink) -> Result<ShortLink> {
        let db = &self.db;
        let active = new_link_to_active_model(&link);

        let result = retry::with_retry(
            &format!("insert_link({})", link.short_code),
            self.retry_config,
            Replay::AtMostOnce,
            || {
                let active = active.clone();
                async move { active.insert(db).await }
            },
        )
        .await;

        match result {
            Ok(model) => {
                info!("Short link created: {}", model.short_code);
                Ok(model_to_shortlink(model))
            }
            Err(e) if is_unique_violation(&e) => Err(LinkpulseError::link_already_exists(
                format!("短码已存在: {}", link.short_code),
            )),
            Err(e) => Err(map_db_err("创建短链接失败", e)),
        }
    }

    /// 删除链接及其点击事件、标签关联。返回链接是否存在
    pub async fn delete_link(&self, id: LinkId) -> Result<bool> {
        let db = &self.db;

        let deleted = retry::with_retry(&format!("delete_link({})", id), self.retry_config, Replay::AtMostOnce, || async {
            let txn = db.begin().await?;

            click_event::Entity::delete_many()
                .filter(click_event::Column::ShortLinkId.eq(id.0))
                .exec(&txn)
                .await?;
            link_tag::Entity::delete_many()
                .filter(link_tag::Column::LinkId.eq(id.0))
                .exec(&txn)
                .await?;
            let result = short_link::Entity::delete_by_id(id.0).exec(&txn).await?;

            txn.commit().await?;
            Ok::<_, DbErr>(result.rows_affected > 0)
        })
        .await
        .map_err(|e| map_db_err("删除短链接失败", e))?;

        if deleted {
            info!("Short link deleted: {}", id);
        }
        Ok(deleted)
    }
}

/// 唯一约束冲突（各后端错误码不同，交给 sea-orm 统一识别）
pub(super) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || err.to_string().to_lowercase().contains("unique constraint")
}
