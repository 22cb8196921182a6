pub mod api_key;
pub mod click_event;
pub mod link_tag;
pub mod short_link;
pub mod tag;
pub mod user;

pub use api_key::Entity as ApiKeyEntity;
pub use click_event::Entity as ClickEventEntity;
pub use link_tag::Entity as LinkTagEntity;
pub use short_link::Entity as ShortLinkEntity;
pub use tag::Entity as TagEntity;
pub use user::Entity as UserEntity;
