//! 点击元数据采集
//!
//! 从原始请求信息（IP、User-Agent、Referer）构造 `ClickMetadata`：
//! woothee 解析设备/浏览器/系统，GeoIP 解析国家/城市。

pub mod geoip;
pub mod metadata;
pub mod user_agent;

pub use geoip::{GeoInfo, GeoIpLookup, geoip_from_config};
pub use metadata::RequestParts;
pub use user_agent::{ParsedUserAgent, parse_user_agent};
