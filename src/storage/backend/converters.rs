use sea_orm::ActiveValue::{NotSet, Set};

use crate::storage::models::{
    ApiKey, ApiKeyId, ClickEvent, LinkId, NewApiKey, NewClickEvent, NewShortLink, ShortLink, Tag,
    TagId, UserId,
};
use migration::entities::{api_key, click_event, short_link, tag};

/// 将 Sea-ORM Model 转换为 ShortLink
pub fn model_to_shortlink(model: short_link::Model) -> ShortLink {
    ShortLink {
        id: LinkId(model.id),
        original_url: model.original_url,
        short_code: model.short_code,
        created_at: model.created_at,
        expires_at: model.expires_at,
        password: model.password,
        owner: model.user_id.map(UserId),
        qr_code_url: model.qr_code_url,
        // 计数列只会递增，负值只可能来自手工改库
        clicks: model.clicks.max(0) as u64,
    }
}

pub fn new_link_to_active_model(link: &NewShortLink) -> short_link::ActiveModel {
    short_link::ActiveModel {
        id: NotSet,
        original_url: Set(link.original_url.clone()),
        short_code: Set(link.short_code.clone()),
        created_at: Set(link.created_at),
        expires_at: Set(link.expires_at),
        password: Set(link.password.clone()),
        user_id: Set(link.owner.as_ref().map(|u| u.0.clone())),
        qr_code_url: Set(link.qr_code_url.clone()),
        clicks: Set(0),
    }
}

pub fn new_event_to_active_model(event: &NewClickEvent) -> click_event::ActiveModel {
    let meta = &event.metadata;
    click_event::ActiveModel {
        id: NotSet,
        short_link_id: Set(event.link_id.0),
        clicked_at: Set(event.clicked_at),
        ip_address: Set(meta.ip_address.clone()),
        user_agent: Set(meta.user_agent.clone()),
        referrer: Set(meta.referrer.clone()),
        country: Set(meta.country.clone()),
        city: Set(meta.city.clone()),
        device: Set(meta.device.clone()),
        browser: Set(meta.browser.clone()),
        os: Set(meta.os.clone()),
    }
}

pub fn model_to_click_event(model: click_event::Model) -> ClickEvent {
    ClickEvent {
        id: model.id,
        link_id: LinkId(model.short_link_id),
        clicked_at: model.clicked_at,
        ip_address: model.ip_address,
        user_agent: model.user_agent,
        referrer: model.referrer,
        country: model.country,
        city: model.city,
        device: model.device,
        browser: model.browser,
        os: model.os,
    }
}

pub fn model_to_tag(model: tag::Model) -> Tag {
    Tag {
        id: TagId(model.id),
        name: model.name,
        owner: UserId(model.user_id),
    }
}

pub fn model_to_api_key(model: api_key::Model) -> ApiKey {
    ApiKey {
        id: ApiKeyId(model.id),
        key: model.key,
        user_id: UserId(model.user_id),
        name: model.name,
        created_at: model.created_at,
        last_used: model.last_used,
        expires_at: model.expires_at,
    }
}

pub fn new_api_key_to_active_model(
    key: &NewApiKey,
    created_at: chrono::DateTime<chrono::Utc>,
) -> api_key::ActiveModel {
    api_key::ActiveModel {
        id: NotSet,
        key: Set(key.key.clone()),
        user_id: Set(key.user_id.0.clone()),
        name: Set(key.name.clone()),
        created_at: Set(created_at),
        last_used: Set(None),
        expires_at: Set(key.expires_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::ClickMetadata;
    use chrono::{Duration, Utc};
    use sea_orm::ActiveValue;

    fn create_test_model() -> short_link::Model {
        short_link::Model {
            id: 9,
            original_url: "https://example.com".to_string(),
            short_code: "abc123".to_string(),
            created_at: Utc::now(),
            expires_at: Some(Utc::now() + Duration::days(7)),
            password: Some("hashed_password".to_string()),
            user_id: Some("alice".to_string()),
            qr_code_url: None,
            clicks: 42,
        }
    }

    #[test]
    fn test_model_to_shortlink() {
        let link = model_to_shortlink(create_test_model());

        assert_eq!(link.id, LinkId(9));
        assert_eq!(link.short_code, "abc123");
        assert_eq!(link.owner, Some(UserId::from("alice")));
        assert_eq!(link.clicks, 42);
    }

    #[test]
    fn test_model_to_shortlink_negative_clicks() {
        let mut model = create_test_model();
        model.clicks = -5;
        assert_eq!(model_to_shortlink(model).clicks, 0);
    }

    #[test]
    fn test_new_link_to_active_model_starts_at_zero_clicks() {
        let new_link = NewShortLink {
            original_url: "https://target.com".to_string(),
            short_code: "xyz789".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            password: None,
            owner: None,
            qr_code_url: Some("https://qr.example/xyz789.png".to_string()),
        };
        let am = new_link_to_active_model(&new_link);

        assert!(matches!(am.id, ActiveValue::NotSet));
        assert!(matches!(am.clicks, ActiveValue::Set(0)));
        assert!(matches!(am.user_id, ActiveValue::Set(None)));
    }

    #[test]
    fn test_new_event_keeps_metadata_as_given() {
        let event = NewClickEvent::new(
            LinkId(3),
            ClickMetadata {
                referrer: Some("https://news.example".to_string()),
                country: Some("DE".to_string()),
                ..Default::default()
            },
        );
        let am = new_event_to_active_model(&event);

        assert!(matches!(am.short_link_id, ActiveValue::Set(3)));
        assert!(matches!(am.ip_address, ActiveValue::Set(None)));
        assert!(matches!(&am.country, ActiveValue::Set(Some(c)) if c == "DE"));
    }
}
