use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - database: 数据库连接与重试
/// - logging: 日志输出
/// - resolver: 跳转解析缓存
/// - analytics: 点击元数据采集
/// - features: 短码生成等业务参数
/// - api_keys: API Key 校验行为
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
    #[serde(default)]
    pub api_keys: ApiKeyConfig,
}

impl StaticConfig {
    /// 从 config.toml 和环境变量加载配置
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    /// 从指定 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML > 默认值
    /// ENV 前缀：LP，分隔符：__
    /// 示例：LP__DATABASE__DATABASE_URL=sqlite://links.db
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LP")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config.normalized()
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 把越界的取值换回默认值
    ///
    /// random_code_length 必须落在 1..=MAX_SHORT_CODE_LEN，否则生成的短码无法被解析
    pub fn normalized(mut self) -> Self {
        let len = self.features.random_code_length;
        if !(1..=crate::utils::MAX_SHORT_CODE_LEN).contains(&len) {
            eprintln!(
                "[WARN] features.random_code_length = {} is outside 1..={}, using {}",
                len,
                crate::utils::MAX_SHORT_CODE_LEN,
                default_random_code_length()
            );
            self.features.random_code_length = default_random_code_length();
        }
        self
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 跳转解析缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// 正向缓存 TTL 上限（秒），实际 TTL 不超过链接剩余有效期
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    /// 不存在短码的负缓存 TTL（秒）
    #[serde(default = "default_negative_ttl")]
    pub negative_ttl_secs: u64,
}

/// 点击元数据采集配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 是否在点击事件中保存 IP
    #[serde(default = "default_store_ip")]
    pub store_ip: bool,
    #[serde(default)]
    pub geo_lookup: bool,
    /// MaxMindDB 文件路径 (GeoLite2-City.mmdb)
    #[serde(default)]
    pub maxminddb_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_random_code_length")]
    pub random_code_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyConfig {
    /// last_used 更新放到后台任务，不阻塞校验返回
    #[serde(default = "default_touch_in_background")]
    pub touch_in_background: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_database_url() -> String {
    "sqlite://linkpulse.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    10000
}

fn default_negative_ttl() -> u64 {
    60
}

fn default_store_ip() -> bool {
    true
}

fn default_random_code_length() -> usize {
    6
}

fn default_touch_in_background() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_enabled: default_cache_enabled(),
            cache_ttl_secs: default_cache_ttl(),
            cache_capacity: default_cache_capacity(),
            negative_ttl_secs: default_negative_ttl(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            store_ip: default_store_ip(),
            geo_lookup: false,
            maxminddb_path: None,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            random_code_length: default_random_code_length(),
        }
    }
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            touch_in_background: default_touch_in_background(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert!(config.database.database_url.starts_with("sqlite://"));
        assert!(config.resolver.cache_enabled);
        assert_eq!(config.features.random_code_length, 6);
        assert!(config.api_keys.touch_in_background);
        assert!(!config.analytics.geo_lookup);
    }

    #[test]
    fn test_sample_config_round_trips_through_toml() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[database]"));
        assert!(sample.contains("[resolver]"));

        let parsed: StaticConfig = toml::from_str(&sample).expect("sample config should parse");
        assert_eq!(parsed.resolver.negative_ttl_secs, 60);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed: StaticConfig = toml::from_str(
            r#"
            [resolver]
            cache_enabled = false
            "#,
        )
        .expect("partial config should parse");

        assert!(!parsed.resolver.cache_enabled);
        assert_eq!(parsed.resolver.cache_ttl_secs, 300);
        assert_eq!(parsed.database.retry_count, 3);
    }

    #[test]
    fn test_out_of_range_code_length_reset() {
        for bad in [0, 129, 10_000] {
            let mut config = StaticConfig::default();
            config.features.random_code_length = bad;
            assert_eq!(config.normalized().features.random_code_length, 6);
        }

        let mut config = StaticConfig::default();
        config.features.random_code_length = 128;
        assert_eq!(config.normalized().features.random_code_length, 128);
    }

    #[test]
    fn test_load_from_missing_file_falls_back_to_defaults() {
        let config = StaticConfig::load_from("/nonexistent/linkpulse-config.toml");
        assert_eq!(config.logging.level, "info");
    }
}
