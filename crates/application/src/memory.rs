//! 基于内存的仓储实现，用于服务层测试与本地演示。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use domain::{Item, ItemId, Message, RepositoryError, RepositoryResult, User, UserEmail, UserId};

use crate::repository::{ItemFilter, ItemRepository, MessageRepository, UserRepository};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|stored| stored.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(Uuid::from(user.id), user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> RepositoryResult<User> {
        let mut users = self.users.write().await;
        if !users.contains_key(&Uuid::from(user.id)) {
            return Err(RepositoryError::NotFound);
        }
        users.insert(Uuid::from(user.id), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&Uuid::from(id)).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> RepositoryResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email == *email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[UserId]) -> RepositoryResult<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| users.get(&Uuid::from(*id)).cloned())
            .collect())
    }

    async fn list(&self) -> RepositoryResult<Vec<User>> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(users)
    }
}

#[derive(Default)]
pub struct InMemoryItemRepository {
    items: RwLock<HashMap<Uuid, Item>>,
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn create(&self, item: Item) -> RepositoryResult<Item> {
        let mut items = self.items.write().await;
        if items.contains_key(&Uuid::from(item.id)) {
            return Err(RepositoryError::Conflict);
        }
        items.insert(Uuid::from(item.id), item.clone());
        Ok(item)
    }

    async fn update(&self, mut item: Item) -> RepositoryResult<Item> {
        let mut items = self.items.write().await;
        let stored = items
            .get(&Uuid::from(item.id))
            .ok_or(RepositoryError::NotFound)?;
        if stored.version != item.version {
            return Err(RepositoryError::Conflict);
        }
        item.version += 1;
        items.insert(Uuid::from(item.id), item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: ItemId) -> RepositoryResult<Option<Item>> {
        Ok(self.items.read().await.get(&Uuid::from(id)).cloned())
    }

    async fn find_by_ids(&self, ids: &[ItemId]) -> RepositoryResult<Vec<Item>> {
        let items = self.items.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| items.get(&Uuid::from(*id)).cloned())
            .collect())
    }

    async fn list(&self, filter: &ItemFilter) -> RepositoryResult<Vec<Item>> {
        let items = self.items.read().await;
        let mut matched: Vec<Item> = items
            .values()
            .filter(|item| {
                filter.status.is_none_or(|status| item.status == status)
                    && filter.seller.is_none_or(|seller| item.seller_id == seller)
                    && filter
                        .liked_by
                        .is_none_or(|user| item.liked_by.contains(&user))
                    && filter
                        .category
                        .is_none_or(|category| item.category == category)
                    && filter
                        .condition
                        .is_none_or(|condition| item.condition == condition)
                    && filter.min_price.is_none_or(|min| item.price.value() >= min)
                    && filter.max_price.is_none_or(|max| item.price.value() <= max)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }
}

#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: RwLock<Vec<Message>>,
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn list_for_user(&self, user_id: UserId) -> RepositoryResult<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut matched: Vec<Message> = messages
            .iter()
            .filter(|message| message.sender_id == user_id || message.receiver_id == user_id)
            .cloned()
            .collect();
        // 时间相同的消息按插入顺序靠后者视为更新
        matched.reverse();
        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matched)
    }

    async fn list_thread(
        &self,
        item_id: ItemId,
        user_a: UserId,
        user_b: UserId,
    ) -> RepositoryResult<Vec<Message>> {
        let messages = self.messages.read().await;
        let mut matched: Vec<Message> = messages
            .iter()
            .filter(|message| {
                message.item_id == item_id
                    && ((message.sender_id == user_a && message.receiver_id == user_b)
                        || (message.sender_id == user_b && message.receiver_id == user_a))
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(matched)
    }

    async fn mark_read_for_receiver(&self, receiver_id: UserId) -> RepositoryResult<u64> {
        let mut messages = self.messages.write().await;
        let mut updated = 0;
        for message in messages.iter_mut() {
            if message.receiver_id == receiver_id && !message.read {
                message.mark_read();
                updated += 1;
            }
        }
        Ok(updated)
    }
}
