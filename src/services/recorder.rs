//! 点击记录
//!
//! 计数是权威数据，点击事件是尽力而为：事务写入确定失败时退回到只加计数，
//! 提交结果未知时不补加。

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::errors::{LinkpulseError, Result};
use crate::storage::{ClickMetadata, LinkGateway, LinkId, NewClickEvent};

#[derive(Clone)]
pub struct ClickRecorder {
    gateway: Arc<dyn LinkGateway>,
}

impl ClickRecorder {
    pub fn new(gateway: Arc<dyn LinkGateway>) -> Self {
        Self { gateway }
    }

    pub async fn record(&self, link_id: LinkId, metadata: ClickMetadata) -> Result<()> {
        let event = NewClickEvent::new(link_id, metadata);

        match self.gateway.record_click(event).await {
            Ok(()) => Ok(()),
            Err(e @ LinkpulseError::LinkNotFound(_)) => Err(e),
            // 可能已经计过数，补加会重复
            Err(e @ LinkpulseError::WriteOutcomeUnknown(_)) => {
                warn!("Click for link {} may not have been counted: {}", link_id, e);
                Err(e)
            }
            Err(e) => {
                warn!(
                    "Click event for link {} dropped, counting only: {}",
                    link_id, e
                );
                self.gateway.atomic_increment_clicks(link_id).await
            }
        }
    }

    /// 在 runtime 上独立执行，调用方取消不会影响计数
    pub fn record_detached(&self, link_id: LinkId, metadata: ClickMetadata) -> JoinHandle<()> {
        let recorder = self.clone();
        tokio::spawn(async move {
            match recorder.record(link_id, metadata).await {
                Ok(()) => debug!("Detached click recorded for link {}", link_id),
                Err(e) => error!("Failed to record click for link {}: {}", link_id, e),
            }
        })
    }
}
