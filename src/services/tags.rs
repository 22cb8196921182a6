//! 为链接挂标签
//!
//! 标签属于链接 owner 的命名空间；单个标签失败不影响其它标签，结果汇总在报告里。

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{LinkpulseError, Result};
use crate::storage::{LinkGateway, LinkId, Tag, UserId};

pub const MAX_TAG_NAME_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct TagFailure {
    pub name: String,
    pub error: LinkpulseError,
}

#[derive(Debug, Clone, Default)]
pub struct TagAttachReport {
    pub attached: Vec<Tag>,
    pub failed: Vec<TagFailure>,
}

impl TagAttachReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TagAssociator {
    gateway: Arc<dyn LinkGateway>,
}

impl TagAssociator {
    pub fn new(gateway: Arc<dyn LinkGateway>) -> Self {
        Self { gateway }
    }

    /// 重复调用同一组标签不会产生新行，返回的 `attached` 相同
    pub async fn attach_tags(
        &self,
        link_id: LinkId,
        owner: &UserId,
        tag_names: &HashSet<String>,
    ) -> Result<TagAttachReport> {
        let link = self
            .gateway
            .find_link_by_id(link_id)
            .await?
            .ok_or_else(|| LinkpulseError::link_not_found(format!("link {}", link_id)))?;

        if !link.is_owned_by(owner) {
            return Err(LinkpulseError::forbidden(format!(
                "link {} is not owned by {}",
                link_id, owner
            )));
        }

        let mut report = TagAttachReport::default();

        // 去空白后去重，按名字排序保证处理顺序稳定
        let mut names = BTreeSet::new();
        for raw in tag_names {
            let name = raw.trim();
            if name.is_empty() {
                report.failed.push(TagFailure {
                    name: raw.clone(),
                    error: LinkpulseError::validation("tag name is empty"),
                });
            } else if name.chars().count() > MAX_TAG_NAME_LEN {
                report.failed.push(TagFailure {
                    name: raw.clone(),
                    error: LinkpulseError::validation(format!(
                        "tag name exceeds {} characters",
                        MAX_TAG_NAME_LEN
                    )),
                });
            } else {
                names.insert(name.to_string());
            }
        }

        for name in names {
            match self.attach_one(link_id, owner, &name).await {
                Ok(tag) => report.attached.push(tag),
                Err(error) => {
                    warn!("Failed to attach tag '{}' to link {}: {}", name, link_id, error);
                    report.failed.push(TagFailure { name, error });
                }
            }
        }

        info!(
            "Tagged link {}: {} attached, {} failed",
            link_id,
            report.attached.len(),
            report.failed.len()
        );
        Ok(report)
    }

    pub async fn tags_for_link(&self, link_id: LinkId) -> Result<Vec<Tag>> {
        self.gateway.tags_for_link(link_id).await
    }

    async fn attach_one(&self, link_id: LinkId, owner: &UserId, name: &str) -> Result<Tag> {
        let tag = self.gateway.find_or_create_tag(name, owner).await?;
        self.gateway.upsert_link_tag(link_id, tag.id).await?;
        Ok(tag)
    }
}
