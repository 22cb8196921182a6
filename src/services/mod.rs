//! Service layer for business logic
//!
//! 每个服务只依赖 `LinkGateway`（链接管理额外需要 `SeaOrmStorage` 的写操作），
//! HTTP 层、CLI 或嵌入方直接组合使用。

pub mod api_keys;
pub mod links;
pub mod recorder;
pub mod resolver;
pub mod tags;

pub use api_keys::{ApiKeyValidator, AuthenticatedKey};
pub use links::{CreateLinkRequest, IssuedApiKey, LinkCreateResult, LinkService};
pub use recorder::ClickRecorder;
pub use resolver::{LinkResolver, ResolvedLink};
pub use tags::{MAX_TAG_NAME_LEN, TagAssociator, TagAttachReport, TagFailure};
