use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::AnalyticsConfig;

/// 地理位置信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoInfo {
    /// ISO 3166-1 alpha-2 国家代码 (e.g., "CN", "US")
    pub country: Option<String>,
    pub city: Option<String>,
}

/// GeoIP 查询 trait
#[async_trait]
pub trait GeoIpLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo>;

    /// provider 名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 按配置构造 provider
///
/// `geo_lookup = false`、未配置 `maxminddb_path` 或数据库无法打开时返回 None，
/// 点击照常记录，只是没有国家/城市字段。
pub fn geoip_from_config(config: &AnalyticsConfig) -> Option<Arc<dyn GeoIpLookup>> {
    if !config.geo_lookup {
        debug!("GeoIP: lookup disabled");
        return None;
    }

    let Some(path) = config.maxminddb_path.as_deref() else {
        warn!("GeoIP: geo_lookup enabled but maxminddb_path is not set");
        return None;
    };

    open_provider(path)
}

#[cfg(feature = "geoip")]
fn open_provider(path: &str) -> Option<Arc<dyn GeoIpLookup>> {
    match super::MaxMindProvider::new(path) {
        Ok(provider) => {
            info!("GeoIP: Using MaxMind database at {}", path);
            Some(Arc::new(provider))
        }
        Err(e) => {
            warn!("GeoIP: Failed to load MaxMind database at {}: {}", path, e);
            None
        }
    }
}

#[cfg(not(feature = "geoip"))]
fn open_provider(path: &str) -> Option<Arc<dyn GeoIpLookup>> {
    info!(
        "GeoIP: built without the geoip feature, ignoring database at {}",
        path
    );
    None
}
