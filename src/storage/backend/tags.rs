//! 标签与链接-标签关联
//!
//! 两处写入都是 `INSERT ... ON CONFLICT DO NOTHING`，重复调用不产生新行。

use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use super::converters::model_to_tag;
use super::retry::Replay;
use super::{SeaOrmStorage, conflict_ignored, map_db_err, retry};
use crate::errors::{LinkpulseError, Result};
use crate::storage::models::{LinkId, Tag, TagId, UserId};

use migration::entities::{link_tag, tag};

impl SeaOrmStorage {
    pub(super) async fn find_or_create_tag_row(&self, name: &str, owner: &UserId) -> Result<Tag> {
        let db = &self.db;
        let op_name = format!("find_or_create_tag({}, {})", owner, name);

        let model = retry::with_retry(&op_name, self.retry_config, Replay::Idempotent, || async {
            let active = tag::ActiveModel {
                id: NotSet,
                name: Set(name.to_string()),
                user_id: Set(owner.0.clone()),
            };

            let inserted = conflict_ignored(
                tag::Entity::insert(active)
                    .on_conflict(
                        OnConflict::columns([tag::Column::UserId, tag::Column::Name])
                            .do_nothing()
                            .to_owned(),
                    )
                    .exec(db)
                    .await
                    .map(|_| ()),
            )?;
            if !inserted {
                debug!("Tag '{}' already exists for {}", name, owner);
            }

            // 无论是否新建都回读，并发创建者拿到同一行
            tag::Entity::find()
                .filter(tag::Column::UserId.eq(owner.as_str()))
                .filter(tag::Column::Name.eq(name))
                .one(db)
                .await
        })
        .await
        .map_err(|e| map_db_err("创建标签失败", e))?;

        model
            .map(model_to_tag)
            .ok_or_else(|| LinkpulseError::database_operation(format!("标签写入后未找到: {}", name)))
    }

    pub(super) async fn upsert_link_tag_row(&self, link_id: LinkId, tag_id: TagId) -> Result<()> {
        let db = &self.db;

        retry::with_retry(
            &format!("upsert_link_tag({}, {})", link_id, tag_id),
            self.retry_config,
            Replay::Idempotent,
            || async {
                let active = link_tag::ActiveModel {
                    link_id: Set(link_id.0),
                    tag_id: Set(tag_id.0),
                };
                conflict_ignored(
                    link_tag::Entity::insert(active)
                        .on_conflict(
                            OnConflict::columns([link_tag::Column::LinkId, link_tag::Column::TagId])
                                .do_nothing()
                                .to_owned(),
                        )
                        .exec(db)
                        .await
                        .map(|_| ()),
                )
            },
        )
        .await
        .map_err(|e| map_db_err("关联标签失败", e))?;

        Ok(())
    }

    pub(super) async fn load_tags_for_link(&self, link_id: LinkId) -> Result<Vec<Tag>> {
        let db = &self.db;

        let tag_ids: Vec<i64> = link_tag::Entity::find()
            .filter(link_tag::Column::LinkId.eq(link_id.0))
            .all(db)
            .await
            .map_err(|e| map_db_err("查询标签关联失败", e))?
            .into_iter()
            .map(|m| m.tag_id)
            .collect();

        if tag_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = tag::Entity::find()
            .filter(tag::Column::Id.is_in(tag_ids))
            .order_by_asc(tag::Column::Name)
            .all(db)
            .await
            .map_err(|e| map_db_err("查询标签失败", e))?;

        Ok(models.into_iter().map(model_to_tag).collect())
    }
}
