//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 GeoLite2-City.mmdb 文件把点击的来源 IP 解析为国家代码和城市名。
//! 内网、回环地址不查库，直接返回 `None`。

use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoInfo, GeoIpLookup};
use crate::utils::ip::{is_private_or_local, parse_ip};

/// 基于本地 mmdb 文件的 GeoIP Provider
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 打开 mmdb 文件；文件不存在或格式不对时返回错误，由调用方决定是否降级
    pub fn new(path: impl AsRef<Path>) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

/// `::ffff:a.b.c.d` 还原成 IPv4 后再判断；内网地址返回 `None`
fn routable_addr(ip: &str) -> Option<IpAddr> {
    let addr = match parse_ip(ip)? {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(IpAddr::V6(v6), IpAddr::V4),
        v4 => v4,
    };
    (!is_private_or_local(&addr) && !addr.is_unspecified()).then_some(addr)
}

/// 空字符串按缺失处理；两项都缺失时没有可记录的信息
fn to_geo_info(country: Option<&str>, city: Option<&str>) -> Option<GeoInfo> {
    let keep = |s: Option<&str>| s.filter(|s| !s.is_empty()).map(String::from);
    let country = keep(country);
    let city = keep(city);

    if country.is_none() && city.is_none() {
        return None;
    }
    Some(GeoInfo { country, city })
}

#[async_trait]
impl GeoIpLookup for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> Option<GeoInfo> {
        let ip_addr = routable_addr(ip)?;

        let result = self.reader.lookup(ip_addr).ok()?;
        let record: maxminddb::geoip2::City = result.decode().ok()??;

        let info = to_geo_info(record.country.iso_code, record.city.names.english);
        trace!("MaxMind lookup for {}: {:?}", ip_addr, info);
        info
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_database_fails() {
        assert!(MaxMindProvider::new("/nonexistent/GeoLite2-City.mmdb").is_err());
    }

    #[test]
    fn test_routable_addr() {
        assert_eq!(routable_addr("8.8.8.8"), "8.8.8.8".parse().ok());
        assert_eq!(routable_addr(" ::ffff:1.1.1.1 "), "1.1.1.1".parse().ok());
        assert_eq!(
            routable_addr("2001:4860:4860::8888"),
            "2001:4860:4860::8888".parse().ok()
        );

        for local in [
            "127.0.0.1",
            "10.1.2.3",
            "192.168.0.9",
            "0.0.0.0",
            "::1",
            "::ffff:10.0.0.1",
        ] {
            assert!(routable_addr(local).is_none(), "{}", local);
        }
        assert!(routable_addr("not-an-ip").is_none());
        assert!(routable_addr("").is_none());
    }

    #[test]
    fn test_to_geo_info() {
        let info = to_geo_info(Some("DE"), Some("Berlin")).unwrap();
        assert_eq!(info.country.as_deref(), Some("DE"));
        assert_eq!(info.city.as_deref(), Some("Berlin"));

        let country_only = to_geo_info(Some("US"), Some("")).unwrap();
        assert!(country_only.city.is_none());

        assert!(to_geo_info(None, None).is_none());
        assert!(to_geo_info(Some(""), Some("")).is_none());
    }
}
