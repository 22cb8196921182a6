//! GeoIP 查询
//!
//! 只提供本地 MaxMind GeoLite2 数据库实现（`geoip` feature）。

#[cfg(feature = "geoip")]
mod maxmind;
mod provider;

#[cfg(feature = "geoip")]
pub use maxmind::MaxMindProvider;
pub use provider::{GeoInfo, GeoIpLookup, geoip_from_config};
