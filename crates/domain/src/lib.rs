//! 校园二手交易市场核心领域模型
//!
//! 包含用户、商品、消息等核心实体，商品状态机与点赞/评价不变量，
//! 以及会话视图的纯推导逻辑。

pub mod conversation;
pub mod errors;
pub mod item;
pub mod message;
pub mod user;
pub mod value_objects;

pub use conversation::{
    derive_conversations, Conversation, DerivePolicy, DerivedConversations, ItemSummary,
    MessageView, UserSummary,
};
pub use errors::{DomainError, RepositoryError, RepositoryResult};
pub use item::{Category, Condition, Item, ItemStatus, Rating};
pub use message::Message;
pub use user::User;
pub use value_objects::{
    DisplayName, ItemId, MessageContent, MessageId, PasswordHash, Price, RatingScore, Timestamp,
    UserEmail, UserId,
};
