//! 目标 URL 校验
//!
//! 只接受带主机名的 http/https 绝对地址。校验只做判断，不改写 URL：
//! 存储与跳转使用调用方提供的原始字符串。

use url::Url;

/// 目标 URL 最大长度
pub const MAX_URL_LEN: usize = 8192;

#[derive(Debug, PartialEq, Eq)]
pub enum UrlValidationError {
    EmptyUrl,
    TooLong(usize),
    UnsupportedScheme(String),
    MissingHost,
    InvalidFormat(String),
}

impl std::fmt::Display for UrlValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::TooLong(len) => write!(f, "URL is {} bytes, limit is {}", len, MAX_URL_LEN),
            Self::UnsupportedScheme(scheme) => write!(
                f,
                "Unsupported scheme '{}': only http and https are allowed",
                scheme
            ),
            Self::MissingHost => write!(f, "URL has no host"),
            Self::InvalidFormat(msg) => write!(f, "Invalid URL format: {}", msg),
        }
    }
}

impl std::error::Error for UrlValidationError {}

pub fn validate_url(raw: &str) -> Result<(), UrlValidationError> {
    if raw.trim().is_empty() {
        return Err(UrlValidationError::EmptyUrl);
    }
    if raw.len() > MAX_URL_LEN {
        return Err(UrlValidationError::TooLong(raw.len()));
    }
    // 前后空白会被 Url::parse 吞掉，但存储的是原串，直接拒绝
    if raw.trim() != raw {
        return Err(UrlValidationError::InvalidFormat(
            "leading or trailing whitespace".to_string(),
        ));
    }

    let parsed = Url::parse(raw).map_err(|e| UrlValidationError::InvalidFormat(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        // javascript:, data:, file:, vbscript: ...
        other => return Err(UrlValidationError::UnsupportedScheme(other.to_string())),
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(())
}
