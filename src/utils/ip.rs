use std::net::IpAddr;

/// 私有、回环或链路本地地址（不做地理位置查询）
pub fn is_private_or_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback()
                || (first & 0xfe00) == 0xfc00 // fc00::/7 ULA
                || (first & 0xffc0) == 0xfe80 // fe80::/10 link-local
        }
    }
}

/// 解析 IP 字符串，失败返回 None
pub fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}
