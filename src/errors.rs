use std::fmt;

#[derive(Debug, Clone)]
pub enum LinkpulseError {
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    Serialization(String),
    DateParse(String),
    FileOperation(String),
    LinkNotFound(String),
    LinkExpired(String),
    PasswordRequired(String),
    PasswordMismatch(String),
    Forbidden(String),
    InvalidApiKey(String),
    ApiKeyExpired(String),
    StoreUnavailable(String),
    LinkAlreadyExists(String),
    Validation(String),
    PasswordHash(String),
    WriteOutcomeUnknown(String),
}

impl LinkpulseError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkpulseError::DatabaseConfig(_) => "E001",
            LinkpulseError::DatabaseConnection(_) => "E002",
            LinkpulseError::DatabaseOperation(_) => "E003",
            LinkpulseError::Serialization(_) => "E004",
            LinkpulseError::DateParse(_) => "E005",
            LinkpulseError::FileOperation(_) => "E006",
            LinkpulseError::LinkNotFound(_) => "E101",
            LinkpulseError::LinkExpired(_) => "E102",
            LinkpulseError::PasswordRequired(_) => "E103",
            LinkpulseError::PasswordMismatch(_) => "E104",
            LinkpulseError::Forbidden(_) => "E105",
            LinkpulseError::InvalidApiKey(_) => "E106",
            LinkpulseError::ApiKeyExpired(_) => "E107",
            LinkpulseError::StoreUnavailable(_) => "E108",
            LinkpulseError::LinkAlreadyExists(_) => "E109",
            LinkpulseError::Validation(_) => "E110",
            LinkpulseError::PasswordHash(_) => "E111",
            LinkpulseError::WriteOutcomeUnknown(_) => "E112",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkpulseError::DatabaseConfig(_) => "Database Configuration Error",
            LinkpulseError::DatabaseConnection(_) => "Database Connection Error",
            LinkpulseError::DatabaseOperation(_) => "Database Operation Error",
            LinkpulseError::Serialization(_) => "Serialization Error",
            LinkpulseError::DateParse(_) => "Date Parse Error",
            LinkpulseError::FileOperation(_) => "File Operation Error",
            LinkpulseError::LinkNotFound(_) => "Link Not Found",
            LinkpulseError::LinkExpired(_) => "Link Expired",
            LinkpulseError::PasswordRequired(_) => "Password Required",
            LinkpulseError::PasswordMismatch(_) => "Password Mismatch",
            LinkpulseError::Forbidden(_) => "Forbidden",
            LinkpulseError::InvalidApiKey(_) => "Invalid API Key",
            LinkpulseError::ApiKeyExpired(_) => "API Key Expired",
            LinkpulseError::StoreUnavailable(_) => "Store Unavailable",
            LinkpulseError::LinkAlreadyExists(_) => "Link Already Exists",
            LinkpulseError::Validation(_) => "Validation Error",
            LinkpulseError::PasswordHash(_) => "Password Hash Error",
            LinkpulseError::WriteOutcomeUnknown(_) => "Write Outcome Unknown",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkpulseError::DatabaseConfig(msg)
            | LinkpulseError::DatabaseConnection(msg)
            | LinkpulseError::DatabaseOperation(msg)
            | LinkpulseError::Serialization(msg)
            | LinkpulseError::DateParse(msg)
            | LinkpulseError::FileOperation(msg)
            | LinkpulseError::LinkNotFound(msg)
            | LinkpulseError::LinkExpired(msg)
            | LinkpulseError::PasswordRequired(msg)
            | LinkpulseError::PasswordMismatch(msg)
            | LinkpulseError::Forbidden(msg)
            | LinkpulseError::InvalidApiKey(msg)
            | LinkpulseError::ApiKeyExpired(msg)
            | LinkpulseError::StoreUnavailable(msg)
            | LinkpulseError::LinkAlreadyExists(msg)
            | LinkpulseError::Validation(msg)
            | LinkpulseError::PasswordHash(msg)
            | LinkpulseError::WriteOutcomeUnknown(msg) => msg,
        }
    }

    /// Outcomes the caller renders to the visitor (404 page, password
    /// prompt, 401/403). Never retried.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            LinkpulseError::LinkNotFound(_)
                | LinkpulseError::LinkExpired(_)
                | LinkpulseError::PasswordRequired(_)
                | LinkpulseError::PasswordMismatch(_)
                | LinkpulseError::Forbidden(_)
                | LinkpulseError::InvalidApiKey(_)
                | LinkpulseError::ApiKeyExpired(_)
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, LinkpulseError::StoreUnavailable(_))
    }

    /// 格式化为彩色输出（用于 CLI）
    #[cfg(feature = "cli")]
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkpulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkpulseError {}

// 便捷的构造函数
impl LinkpulseError {
    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DatabaseOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Serialization(msg.into())
    }

    pub fn date_parse<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DateParse(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::FileOperation(msg.into())
    }

    pub fn link_not_found<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::LinkNotFound(msg.into())
    }

    pub fn link_expired<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::LinkExpired(msg.into())
    }

    pub fn password_required<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::PasswordRequired(msg.into())
    }

    pub fn password_mismatch<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::PasswordMismatch(msg.into())
    }

    pub fn forbidden<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Forbidden(msg.into())
    }

    pub fn invalid_api_key<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::InvalidApiKey(msg.into())
    }

    pub fn api_key_expired<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::ApiKeyExpired(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::StoreUnavailable(msg.into())
    }

    pub fn link_already_exists<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::LinkAlreadyExists(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Validation(msg.into())
    }

    pub fn password_hash<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::PasswordHash(msg.into())
    }

    /// 连接在写入途中断开，无法确定是否已提交
    pub fn write_outcome_unknown<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::WriteOutcomeUnknown(msg.into())
    }
}

impl From<sea_orm::DbErr> for LinkpulseError {
    fn from(err: sea_orm::DbErr) -> Self {
        if crate::storage::backend::retry::is_transient(&err) {
            LinkpulseError::StoreUnavailable(err.to_string())
        } else {
            LinkpulseError::DatabaseOperation(err.to_string())
        }
    }
}

impl From<std::io::Error> for LinkpulseError {
    fn from(err: std::io::Error) -> Self {
        LinkpulseError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkpulseError {
    fn from(err: serde_json::Error) -> Self {
        LinkpulseError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LinkpulseError {
    fn from(err: chrono::ParseError) -> Self {
        LinkpulseError::DateParse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkpulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            LinkpulseError::database_config(""),
            LinkpulseError::database_connection(""),
            LinkpulseError::database_operation(""),
            LinkpulseError::serialization(""),
            LinkpulseError::date_parse(""),
            LinkpulseError::file_operation(""),
            LinkpulseError::link_not_found(""),
            LinkpulseError::link_expired(""),
            LinkpulseError::password_required(""),
            LinkpulseError::password_mismatch(""),
            LinkpulseError::forbidden(""),
            LinkpulseError::invalid_api_key(""),
            LinkpulseError::api_key_expired(""),
            LinkpulseError::store_unavailable(""),
            LinkpulseError::link_already_exists(""),
            LinkpulseError::validation(""),
            LinkpulseError::password_hash(""),
            LinkpulseError::write_outcome_unknown(""),
        ];
        let codes: std::collections::HashSet<_> = all.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_user_facing_and_transient() {
        assert!(LinkpulseError::password_required("abc").is_user_facing());
        assert!(LinkpulseError::link_expired("abc").is_user_facing());
        assert!(!LinkpulseError::store_unavailable("down").is_user_facing());
        assert!(LinkpulseError::store_unavailable("down").is_transient());
        assert!(!LinkpulseError::link_not_found("abc").is_transient());
        // 结果未知的写入不能当作可重试
        assert!(!LinkpulseError::write_outcome_unknown("commit").is_transient());
    }

    #[test]
    fn test_format_simple() {
        let err = LinkpulseError::link_not_found("abc123");
        assert_eq!(err.format_simple(), "Link Not Found: abc123");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_from_db_err_classification() {
        let conn = sea_orm::DbErr::ConnectionAcquire(sea_orm::error::ConnAcquireErr::Timeout);
        assert!(matches!(
            LinkpulseError::from(conn),
            LinkpulseError::StoreUnavailable(_)
        ));

        let missing = sea_orm::DbErr::RecordNotFound("gone".to_string());
        assert!(matches!(
            LinkpulseError::from(missing),
            LinkpulseError::DatabaseOperation(_)
        ));
    }
}
