pub mod backend;
pub mod gateway;
pub mod models;

pub use backend::SeaOrmStorage;
pub use gateway::LinkGateway;
pub use models::{
    ApiKey, ApiKeyId, ClickEvent, ClickMetadata, LinkId, LinkStatus, NewApiKey, NewClickEvent,
    NewShortLink, ShortLink, Tag, TagId, UserId,
};
