use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use domain::{
    derive_conversations, Conversation, DerivePolicy, DomainError, ItemId, ItemSummary, Message,
    MessageContent, MessageId, MessageView, UserId, UserSummary,
};

use crate::clock::Clock;
use crate::error::ApplicationResult;
use crate::repository::{ItemRepository, MessageRepository, UserRepository};

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub item_id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub content: String,
}

pub struct MessagingServiceDependencies {
    pub message_repository: Arc<dyn MessageRepository>,
    pub item_repository: Arc<dyn ItemRepository>,
    pub user_repository: Arc<dyn UserRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 消息用例：发送、查询、已读回执与会话推导。
pub struct MessagingService {
    deps: MessagingServiceDependencies,
    derive_policy: DerivePolicy,
}

impl MessagingService {
    pub fn new(deps: MessagingServiceDependencies) -> Self {
        Self::with_policy(deps, DerivePolicy::default())
    }

    pub fn with_policy(deps: MessagingServiceDependencies, derive_policy: DerivePolicy) -> Self {
        Self {
            deps,
            derive_policy,
        }
    }

    /// 以认证用户身份发送消息。声称的发送者与认证身份不一致时
    /// 拒绝请求，不落任何数据。
    pub async fn send_message(
        &self,
        authenticated_user: Uuid,
        request: SendMessageRequest,
    ) -> ApplicationResult<MessageView> {
        if request.sender_id != authenticated_user {
            return Err(DomainError::SenderMismatch.into());
        }
        let content = MessageContent::new(request.content)?;

        let message = Message::new(
            MessageId::new(Uuid::new_v4()),
            ItemId::new(request.item_id),
            UserId::new(request.sender_id),
            UserId::new(request.receiver_id),
            content,
            self.deps.clock.now(),
        );
        let stored = self.deps.message_repository.create(message).await?;
        tracing::debug!(message_id = %stored.id, item_id = %stored.item_id, "message sent");

        let item = self.deps.item_repository.find_by_id(stored.item_id).await?;
        let sender = self.deps.user_repository.find_by_id(stored.sender_id).await?;
        let receiver = self
            .deps
            .user_repository
            .find_by_id(stored.receiver_id)
            .await?;
        Ok(MessageView {
            id: stored.id,
            item: item.as_ref().map(ItemSummary::from),
            sender: sender.as_ref().map(UserSummary::from),
            receiver: receiver.as_ref().map(UserSummary::from),
            content: stored.content.as_str().to_owned(),
            read: stored.read,
            created_at: stored.created_at,
        })
    }

    /// 用户收发的全部消息，最新在前，引用实体展开为投影。
    pub async fn messages_for_user(&self, user_id: Uuid) -> ApplicationResult<Vec<MessageView>> {
        let messages = self
            .deps
            .message_repository
            .list_for_user(UserId::new(user_id))
            .await?;
        self.expand(messages).await
    }

    /// 从用户的消息序列推导会话列表。
    pub async fn conversations_for_user(
        &self,
        user_id: Uuid,
    ) -> ApplicationResult<Vec<Conversation>> {
        let user_id = UserId::new(user_id);
        let messages = self.deps.message_repository.list_for_user(user_id).await?;
        let views = self.expand(messages).await?;
        let derived = derive_conversations(user_id, &views, self.derive_policy)?;
        if derived.skipped > 0 {
            tracing::warn!(
                user_id = %user_id,
                skipped = derived.skipped,
                "skipped messages with missing references"
            );
        }
        Ok(derived.conversations)
    }

    /// 某商品下两名用户之间的完整线程，最早在前。
    pub async fn conversation_thread(
        &self,
        item_id: Uuid,
        user_a: Uuid,
        user_b: Uuid,
    ) -> ApplicationResult<Vec<MessageView>> {
        let messages = self
            .deps
            .message_repository
            .list_thread(
                ItemId::new(item_id),
                UserId::new(user_a),
                UserId::new(user_b),
            )
            .await?;
        self.expand(messages).await
    }

    /// 将用户的全部未读消息置为已读。仅账户本人可调用，幂等。
    pub async fn mark_read(
        &self,
        authenticated_user: Uuid,
        user_id: Uuid,
    ) -> ApplicationResult<u64> {
        if user_id != authenticated_user {
            return Err(DomainError::NotAccountOwner.into());
        }
        let updated = self
            .deps
            .message_repository
            .mark_read_for_receiver(UserId::new(user_id))
            .await?;
        Ok(updated)
    }

    /// 批量展开消息引用的商品与用户。缺失的引用展开为 None，
    /// 由读取方决定如何处理。
    async fn expand(&self, messages: Vec<Message>) -> ApplicationResult<Vec<MessageView>> {
        let mut item_ids: Vec<ItemId> = Vec::new();
        let mut user_ids: Vec<UserId> = Vec::new();
        for message in &messages {
            if !item_ids.contains(&message.item_id) {
                item_ids.push(message.item_id);
            }
            for user_id in [message.sender_id, message.receiver_id] {
                if !user_ids.contains(&user_id) {
                    user_ids.push(user_id);
                }
            }
        }

        let items: HashMap<ItemId, ItemSummary> = self
            .deps
            .item_repository
            .find_by_ids(&item_ids)
            .await?
            .iter()
            .map(|item| (item.id, ItemSummary::from(item)))
            .collect();
        let users: HashMap<UserId, UserSummary> = self
            .deps
            .user_repository
            .find_by_ids(&user_ids)
            .await?
            .iter()
            .map(|user| (user.id, UserSummary::from(user)))
            .collect();

        Ok(messages
            .into_iter()
            .map(|message| MessageView {
                id: message.id,
                item: items.get(&message.item_id).cloned(),
                sender: users.get(&message.sender_id).cloned(),
                receiver: users.get(&message.receiver_id).cloned(),
                content: message.content.as_str().to_owned(),
                read: message.read,
                created_at: message.created_at,
            })
            .collect())
    }
}
