use woothee::parser::Parser;

/// woothee 解析结果，`UNKNOWN` 统一映射为 None
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub browser: Option<String>,
    pub os: Option<String>,
    /// pc / smartphone / mobilephone / appliance / crawler
    pub device: Option<String>,
    pub is_bot: bool,
}

fn known(value: &str) -> Option<String> {
    if value.is_empty() || value == "UNKNOWN" {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn parse_user_agent(ua: &str) -> ParsedUserAgent {
    let result = Parser::new().parse(ua).unwrap_or_default();

    ParsedUserAgent {
        browser: known(result.name),
        os: known(result.os),
        device: known(result.category),
        is_bot: result.category == "crawler",
    }
}
