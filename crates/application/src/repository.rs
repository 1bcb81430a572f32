//! 仓储端口。具体实现位于 infrastructure crate。

use async_trait::async_trait;

use domain::{
    Category, Condition, Item, ItemId, ItemStatus, Message, RepositoryResult, User, UserEmail,
    UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> RepositoryResult<User>;
    async fn update(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>>;
    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>>;
    async fn list(&self) -> RepositoryResult<Vec<User>>;
}

/// 商品列表过滤条件。所有字段都是可选的 AND 条件。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemFilter {
    pub status: Option<ItemStatus>,
    pub seller: Option<UserId>,
    pub liked_by: Option<UserId>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn create(&self, item: Item) -> RepositoryResult<Item>;

    /// 乐观并发写入：仅当存储中的版本等于 `item.version` 时生效，
    /// 成功后返回版本递增的商品。版本不匹配返回 `Conflict`。
    async fn update(&self, item: Item) -> RepositoryResult<Item>;

    async fn find_by_id(&self, id: ItemId) -> RepositoryResult<Option<Item>>;
    async fn find_by_ids(&self, ids: &[ItemId]) -> RepositoryResult<Vec<Item>>;
    async fn list(&self, filter: &ItemFilter) -> RepositoryResult<Vec<Item>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> RepositoryResult<Message>;

    /// 用户收发的全部消息，最新在前。
    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Message>>;

    /// 某商品下两名用户之间的完整线程，最早在前。
    async fn list_thread(
        &self,
        item_id: ItemId,
        user_a: UserId,
        user_b: UserId,
    ) -> RepositoryResult<Vec<Message>>;

    /// 将接收者的全部未读消息置为已读，返回受影响条数。
    async fn mark_read_for_receiver(&self, receiver_id: UserId) -> RepositoryResult<u64>;
}
