//! Link management service
//!
//! 创建/删除链接与签发 API Key。写操作通过 `SeaOrmStorage`，
//! 完成后使解析缓存失效。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::errors::{LinkpulseError, Result};
use crate::services::resolver::LinkResolver;
use crate::storage::{ApiKey, LinkGateway, NewApiKey, NewShortLink, SeaOrmStorage, ShortLink, UserId};
use crate::utils::password::process_new_password;
use crate::utils::time_parser::parse_expire_time;
use crate::utils::url_validator::validate_url;
use crate::utils::{MAX_SHORT_CODE_LEN, generate_api_key, generate_random_code, is_valid_short_code};

/// 随机短码冲突时的最大尝试次数
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct CreateLinkRequest {
    pub original_url: String,
    /// 为空时自动生成
    pub short_code: Option<String>,
    /// 明文，入库前哈希
    pub password: Option<String>,
    /// RFC3339 或相对时长（"1d"、"2h30m"）
    pub expires_at: Option<String>,
    pub owner: Option<UserId>,
    pub qr_code_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LinkCreateResult {
    pub link: ShortLink,
    pub generated_code: bool,
}

/// 新签发的 key，明文只在这里出现一次
#[derive(Debug, Clone)]
pub struct IssuedApiKey {
    pub key: ApiKey,
}

pub struct LinkService {
    storage: Arc<SeaOrmStorage>,
    resolver: Option<Arc<LinkResolver>>,
    random_code_length: usize,
}

impl LinkService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        let config = crate::config::get_config();
        Self {
            storage,
            resolver: None,
            random_code_length: config.features.random_code_length,
        }
    }

    /// 写操作后同步失效该 resolver 的缓存
    pub fn with_resolver(mut self, resolver: Arc<LinkResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_code_length(mut self, length: usize) -> Self {
        self.random_code_length = length;
        self
    }

    pub async fn create_link(&self, req: CreateLinkRequest) -> Result<LinkCreateResult> {
        validate_url(&req.original_url).map_err(|e| LinkpulseError::validation(e.to_string()))?;

        let expires_at = match req.expires_at.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => {
                let parsed = parse_expire_time(s).map_err(LinkpulseError::date_parse)?;
                if parsed <= Utc::now() {
                    return Err(LinkpulseError::validation(format!(
                        "expiration '{}' is in the past",
                        s
                    )));
                }
                Some(parsed)
            }
            _ => None,
        };

        let password = process_new_password(req.password.as_deref())
            .map_err(|e| LinkpulseError::password_hash(e.to_string()))?;

        if let Some(owner) = &req.owner {
            self.storage.ensure_user(owner, None).await?;
        }

        let supplied_code = req.short_code.as_deref().map(str::trim).filter(|c| !c.is_empty());
        if let Some(code) = supplied_code {
            if !is_valid_short_code(code) {
                return Err(LinkpulseError::validation(format!(
                    "Invalid short code '{}'. Only alphanumeric, underscore, hyphen, dot, and slash allowed.",
                    code
                )));
            }
        }

        let mut new_link = NewShortLink {
            original_url: req.original_url,
            short_code: String::new(),
            created_at: Utc::now(),
            expires_at,
            password,
            owner: req.owner,
            qr_code_url: req.qr_code_url,
        };

        let (link, generated_code) = match supplied_code {
            Some(code) => {
                new_link.short_code = code.to_string();
                (self.storage.insert_link(new_link).await?, false)
            }
            None => (self.insert_with_generated_code(new_link).await?, true),
        };

        self.invalidate(&link.short_code).await;
        info!(
            "LinkService: created link '{}' -> '{}'",
            link.short_code, link.original_url
        );

        Ok(LinkCreateResult {
            link,
            generated_code,
        })
    }

    async fn insert_with_generated_code(&self, mut new_link: NewShortLink) -> Result<ShortLink> {
        // 生成出解析器不接受的短码等于静默丢链接
        if !(1..=MAX_SHORT_CODE_LEN).contains(&self.random_code_length) {
            return Err(LinkpulseError::validation(format!(
                "random code length {} outside 1..={}",
                self.random_code_length, MAX_SHORT_CODE_LEN
            )));
        }

        for attempt in 1..=MAX_CODE_ATTEMPTS {
            new_link.short_code = generate_random_code(self.random_code_length);
            match self.storage.insert_link(new_link.clone()).await {
                Ok(link) => return Ok(link),
                Err(LinkpulseError::LinkAlreadyExists(_)) => {
                    debug!(
                        "Generated code '{}' collided (attempt {}/{})",
                        new_link.short_code, attempt, MAX_CODE_ATTEMPTS
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Err(LinkpulseError::link_already_exists(format!(
            "no free short code after {} attempts, increase features.random_code_length",
            MAX_CODE_ATTEMPTS
        )))
    }

    pub async fn get_link(&self, code: &str) -> Result<ShortLink> {
        self.storage
            .find_unique_by_code(code)
            .await?
            .ok_or_else(|| LinkpulseError::link_not_found(code.to_string()))
    }

    /// 有 owner 的链接只能由 owner 删除；匿名链接不做限制
    pub async fn delete_link(&self, code: &str, requester: Option<&UserId>) -> Result<()> {
        let link = self.get_link(code).await?;

        if let Some(owner) = &link.owner
            && requester != Some(owner)
        {
            return Err(LinkpulseError::forbidden(format!(
                "link '{}' belongs to another user",
                code
            )));
        }

        if !self.storage.delete_link(link.id).await? {
            return Err(LinkpulseError::link_not_found(code.to_string()));
        }

        self.invalidate(code).await;
        info!("LinkService: deleted link '{}'", code);
        Ok(())
    }

    pub async fn issue_api_key(
        &self,
        user: &UserId,
        name: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<IssuedApiKey> {
        self.storage.ensure_user(user, None).await?;

        let key = self
            .storage
            .insert_api_key(NewApiKey {
                key: generate_api_key(),
                user_id: user.clone(),
                name,
                expires_at,
            })
            .await?;

        Ok(IssuedApiKey { key })
    }

    async fn invalidate(&self, code: &str) {
        if let Some(resolver) = &self.resolver {
            resolver.invalidate(code).await;
        }
    }
}
