//! 点击计数与点击事件
//!
//! 计数只通过 `clicks = clicks + 1` 在数据库侧递增，不做读改写。

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ExprTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::debug;

use super::converters::{model_to_click_event, new_event_to_active_model};
use super::retry::Replay;
use super::{SeaOrmStorage, map_db_err, map_write_err, retry};
use crate::errors::{LinkpulseError, Result};
use crate::storage::models::{ClickEvent, LinkId, NewClickEvent};

use migration::entities::{click_event, short_link};

/// 返回受影响行数，0 表示链接不存在
async fn increment_on<C: ConnectionTrait>(conn: &C, id: LinkId) -> std::result::Result<u64, DbErr> {
    let result = short_link::Entity::update_many()
        .col_expr(
            short_link::Column::Clicks,
            Expr::col(short_link::Column::Clicks).add(Expr::val(1i64)),
        )
        .filter(short_link::Column::Id.eq(id.0))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

impl SeaOrmStorage {
    pub(super) async fn increment_clicks(&self, id: LinkId) -> Result<()> {
        let db = &self.db;
        let affected = retry::with_retry(&format!("increment_clicks({})", id), self.retry_config, Replay::AtMostOnce, || async {
            increment_on(db, id).await
        })
        .await
        .map_err(|e| map_write_err("更新点击计数失败", e))?;

        if affected == 0 {
            return Err(LinkpulseError::link_not_found(format!("链接不存在: {}", id)));
        }
        Ok(())
    }

    pub(super) async fn insert_event(&self, event: &NewClickEvent) -> Result<()> {
        let db = &self.db;
        let active = new_event_to_active_model(event);

        retry::with_retry(&format!("insert_click_event({})", event.link_id), self.retry_config, Replay::AtMostOnce, || {
            let active = active.clone();
            async move { click_event::Entity::insert(active).exec(db).await }
        })
        .await
        .map_err(|e| map_write_err("写入点击事件失败", e))?;

        Ok(())
    }

    /// 计数与事件在同一事务内提交
    ///
    /// UPDATE 放在事务第一条语句，SQLite 下直接拿写锁，避免读锁升级时的 BUSY
    pub(super) async fn record_click_txn(&self, event: &NewClickEvent) -> Result<()> {
        let db = &self.db;
        let id = event.link_id;
        let active = new_event_to_active_model(event);

        let found = retry::with_retry(&format!("record_click({})", id), self.retry_config, Replay::AtMostOnce, || {
            let active = active.clone();
            async move {
                let txn = db.begin().await?;
                if increment_on(&txn, id).await? == 0 {
                    txn.rollback().await?;
                    return Ok(false);
                }
                click_event::Entity::insert(active).exec(&txn).await?;
                txn.commit().await?;
                Ok::<_, DbErr>(true)
            }
        })
        .await
        .map_err(|e| map_write_err("记录点击失败", e))?;

        if !found {
            return Err(LinkpulseError::link_not_found(format!("链接不存在: {}", id)));
        }
        debug!("Click recorded for link {}", id);
        Ok(())
    }

    pub async fn count_click_events(&self, link_id: LinkId) -> Result<u64> {
        click_event::Entity::find()
            .filter(click_event::Column::ShortLinkId.eq(link_id.0))
            .count(&self.db)
            .await
            .map_err(|e| map_db_err("统计点击事件失败", e))
    }

    /// 最近的点击事件，按时间倒序
    pub async fn recent_click_events(&self, link_id: LinkId, limit: u64) -> Result<Vec<ClickEvent>> {
        let models = click_event::Entity::find()
            .filter(click_event::Column::ShortLinkId.eq(link_id.0))
            .order_by_desc(click_event::Column::ClickedAt)
            .order_by_desc(click_event::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| map_db_err("查询点击事件失败", e))?;

        Ok(models.into_iter().map(model_to_click_event).collect())
    }
}
