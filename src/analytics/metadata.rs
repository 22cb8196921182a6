use chrono::{DateTime, Utc};
use tracing::trace;

use super::geoip::GeoIpLookup;
use super::user_agent::parse_user_agent;
use crate::config::AnalyticsConfig;
use crate::storage::ClickMetadata;
use crate::utils::ip::{is_private_or_local, parse_ip};

/// 跳转请求中与统计相关的原始字段
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub received_at: Option<DateTime<Utc>>,
}

/// 空字符串按缺失处理
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ClickMetadata {
    /// 使用全局 analytics 配置
    pub async fn from_request(parts: RequestParts, geo: Option<&dyn GeoIpLookup>) -> Self {
        let config = crate::config::get_config();
        Self::from_request_with(parts, &config.analytics, geo).await
    }

    pub async fn from_request_with(
        parts: RequestParts,
        config: &AnalyticsConfig,
        geo: Option<&dyn GeoIpLookup>,
    ) -> Self {
        let ip = non_empty(parts.ip);
        let user_agent = non_empty(parts.user_agent);

        let parsed = user_agent
            .as_deref()
            .map(parse_user_agent)
            .unwrap_or_default();

        let geo_info = match (config.geo_lookup, geo, ip.as_deref()) {
            (true, Some(provider), Some(raw_ip)) => match parse_ip(raw_ip) {
                Some(addr) if !is_private_or_local(&addr) => {
                    provider.lookup(&addr.to_string()).await
                }
                Some(_) => {
                    trace!("Skipping GeoIP for private address {}", raw_ip);
                    None
                }
                None => None,
            },
            _ => None,
        }
        .unwrap_or_default();

        ClickMetadata {
            clicked_at: Some(parts.received_at.unwrap_or_else(Utc::now)),
            ip_address: if config.store_ip { ip } else { None },
            user_agent,
            referrer: non_empty(parts.referrer),
            country: geo_info.country,
            city: geo_info.city,
            device: parsed.device,
            browser: parsed.browser,
            os: parsed.os,
        }
    }
}
