use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter};
use tracing::info;

use super::converters::{model_to_api_key, new_api_key_to_active_model};
use super::links::is_unique_violation;
use super::retry::Replay;
use super::{SeaOrmStorage, conflict_ignored, map_db_err, retry};
use crate::errors::{LinkpulseError, Result};
use crate::storage::models::{ApiKey, ApiKeyId, NewApiKey, UserId};

use migration::entities::{api_key, user};

impl SeaOrmStorage {
    pub(super) async fn load_api_key(&self, key: &str) -> Result<Option<ApiKey>> {
        let db = &self.db;
        let model = retry::with_retry("find_api_key", self.retry_config, Replay::Idempotent, || async {
            api_key::Entity::find()
                .filter(api_key::Column::Key.eq(key))
                .one(db)
                .await
        })
        .await
        .map_err(|e| map_db_err("查询 API Key 失败", e))?;

        Ok(model.map(model_to_api_key))
    }

    pub(super) async fn set_api_key_last_used(&self, id: ApiKeyId, at: DateTime<Utc>) -> Result<()> {
        let db = &self.db;
        retry::with_retry(&format!("touch_api_key({})", id), self.retry_config, Replay::Idempotent, || async {
            api_key::Entity::update_many()
                .col_expr(
                    api_key::Column::LastUsed,
                    sea_orm::sea_query::Expr::value(at),
                )
                .filter(api_key::Column::Id.eq(id.0))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| map_db_err("更新 API Key 使用时间失败", e))?;

        Ok(())
    }

    pub async fn insert_api_key(&self, key: NewApiKey) -> Result<ApiKey> {
        let db = &self.db;
        let active = new_api_key_to_active_model(&key, Utc::now());

        let result = retry::with_retry("insert_api_key", self.retry_config, Replay::AtMostOnce, || {
            let active = active.clone();
            async move { active.insert(db).await }
        })
        .await;

        match result {
            Ok(model) => {
                info!("API key {} issued for user {}", model.id, model.user_id);
                Ok(model_to_api_key(model))
            }
            Err(e) if is_unique_violation(&e) => Err(LinkpulseError::validation(
                "API key collision, generate a new key",
            )),
            Err(e) => Err(map_db_err("创建 API Key 失败", e)),
        }
    }

    /// 确保用户行存在（外键目标）。已存在时不修改
    pub async fn ensure_user(&self, id: &UserId, email: Option<&str>) -> Result<()> {
        let db = &self.db;
        let now = Utc::now();

        let result = retry::with_retry(&format!("ensure_user({})", id), self.retry_config, Replay::Idempotent, || async {
            let active = user::ActiveModel {
                id: Set(id.0.clone()),
                email: Set(email.map(str::to_string)),
                name: NotSet,
                created_at: Set(now),
            };
            user::Entity::insert(active)
                .on_conflict(OnConflict::column(user::Column::Id).do_nothing().to_owned())
                .exec(db)
                .await
                .map(|_| ())
        })
        .await;

        conflict_ignored(result).map_err(|e| map_db_err("创建用户失败", e))?;
        Ok(())
    }
}
